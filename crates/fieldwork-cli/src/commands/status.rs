//! Status command implementation

use super::Session;
use anyhow::{Context, Result};
use fieldwork::prelude::*;

pub async fn execute(session: &Session) -> Result<()> {
    let congregation = session.congregation.as_str();
    tracing::info!("Checking congregation status: {}", congregation);

    let count = |path: String| async move {
        session
            .store
            .query(&Query::collection(path))
            .await
            .map(|docs| docs.len())
    };
    let territories = count(paths::territories(congregation))
        .await
        .context("Failed to read territories")?;
    let maps = count(paths::maps(congregation))
        .await
        .context("Failed to read addresses")?;
    let units = count(paths::addresses(congregation))
        .await
        .context("Failed to read units")?;

    println!("\nCongregation Status");
    println!("{}", "=".repeat(60));
    println!("Congregation: {}", congregation);
    println!("Territories: {}", territories);
    println!("Addresses: {}", maps);
    println!("Units: {}", units);

    let policy = &session.policy;
    println!("\nHousehold Types:");
    if !policy.has_options() {
        println!("  (none configured)");
    }
    for option in policy.options() {
        let mut flags = Vec::new();
        if option.is_countable {
            flags.push("countable");
        }
        if policy.default_type_id() == Some(option.id.as_str()) {
            flags.push("default");
        }
        println!("  {:<12} {:<24} {}", option.code, option.description, flags.join(", "));
    }

    println!("\nPolicy:");
    println!("  User: {} ({})", policy.user_name(), policy.role().as_str());
    println!("  Admin: {}", policy.is_from_admin());
    println!("  Max not-home tries: {}", policy.max_tries());
    println!("  Link expiry: {}h", policy.default_expiry_hours());
    println!("  Max batch size: {}", session.config.max_batch_size);

    Ok(())
}
