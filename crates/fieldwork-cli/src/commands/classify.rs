//! Classify command implementation

use super::Session;
use anyhow::{Context, Result};

pub async fn execute(session: &Session, map: &str) -> Result<()> {
    let maintenance = session.maintenance()?;
    let address = maintenance
        .address(map)
        .await
        .with_context(|| format!("Failed to read address {}", map))?;
    let units = maintenance
        .units(map)
        .await
        .with_context(|| format!("Failed to read units of {}", map))?;

    let policy = &session.policy;
    let progress = address.progress.aggregate;

    println!("\n{} [{}]", address.name, address.id);
    println!("{}", "=".repeat(60));
    println!(
        "{:<8} {:>5} {:<12} {:<8} {:<10} {:<10} class",
        "unit", "floor", "status", "tries", "countable", "completed"
    );
    for unit in &units {
        println!(
            "{:<8} {:>5} {:<12} {:<8} {:<10} {:<10} {}",
            unit.number,
            unit.floor,
            unit.status.as_str(),
            unit.nhcount,
            policy.is_countable(unit),
            policy.is_completed(unit),
            policy.unit_color(unit, progress)
        );
    }

    println!(
        "\nStored progress: {:.0}%  recomputed: {}%",
        progress,
        policy.aggregate_progress(&units)
    );
    Ok(())
}
