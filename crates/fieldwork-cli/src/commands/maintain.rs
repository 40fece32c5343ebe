//! Mutating commands: recount, reset and floor maintenance

use super::Session;
use anyhow::{Context, Result};

pub async fn recount(session: &Session, map: &str) -> Result<()> {
    session.require_admin()?;
    let progress = session
        .maintenance()?
        .recount(map, &session.policy)
        .await
        .with_context(|| format!("Failed to recount {}", map))?;

    println!(
        "✓ {}: {:.0}% (done {}, not done {}, not home {})",
        map, progress.aggregate, progress.done, progress.notdone, progress.nothome
    );
    session.persist()
}

pub async fn reset(session: &Session, map: &str) -> Result<()> {
    session.require_admin()?;
    let report = session
        .maintenance()?
        .reset_map(map)
        .await
        .with_context(|| format!("Failed to reset {}", map))?;

    println!(
        "✓ Reset {} unit(s) of {} in {} batch(es)",
        report.documents, map, report.partitions
    );
    session.persist()
}

pub async fn delete_floor(session: &Session, map: &str, floor: i64) -> Result<()> {
    session.require_admin()?;
    let report = session
        .maintenance()?
        .delete_floor(map, floor)
        .await
        .with_context(|| format!("Failed to delete floor {} of {}", floor, map))?;

    if report.documents == 0 {
        println!("Floor {} of {} has no units", floor, map);
        return Ok(());
    }
    println!(
        "✓ Deleted {} unit(s) on floor {} of {}",
        report.documents, floor, map
    );
    session.persist()
}

pub async fn add_floor(session: &Session, map: &str, floor: i64, numbers: &[String]) -> Result<()> {
    session.require_admin()?;
    let maintenance = session.maintenance()?;
    let address = maintenance
        .address(map)
        .await
        .with_context(|| format!("Failed to read address {}", map))?;
    let report = maintenance
        .add_floor(&address, floor, numbers, &session.policy)
        .await
        .with_context(|| format!("Failed to add floor {} to {}", floor, map))?;

    println!(
        "✓ Added {} unit(s) on floor {} of {}",
        report.documents, floor, address.name
    );
    session.persist()
}
