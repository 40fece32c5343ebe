//! Territory command: open the live listeners for a territory and print the
//! resulting projections.

use super::Session;
use anyhow::{Context, Result};
use fieldwork::policy::{COLOR_AVAILABLE, COLOR_AVAILABLE_HIGHLIGHT};
use fieldwork::prelude::*;
use fieldwork_listeners::{Category, ListenerRegistry};

pub fn execute(session: &Session, territory: &str, json: bool) -> Result<()> {
    let registry = ListenerRegistry::new(session.store_handle());
    registry
        .switch_congregation(&session.congregation)
        .context("Failed to open territory listener")?;
    registry
        .switch_territory(territory)
        .context("Failed to open map and link listeners")?;

    let map_ids: Vec<String> = registry
        .snapshot()
        .addresses
        .iter()
        .map(|a| a.map_id().to_string())
        .collect();
    for map_id in &map_ids {
        registry
            .open(Category::Address, map_id)
            .with_context(|| format!("Failed to open unit listener for {}", map_id))?;
    }

    let view = registry.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&*view)?);
        return Ok(());
    }

    let name = view
        .territories
        .iter()
        .find(|t| t.id == territory)
        .map(|t| format!("{} {}", t.code, t.name))
        .unwrap_or_else(|| territory.to_string());
    println!("\nTerritory {}", name);
    println!("{}", "=".repeat(60));
    println!("Overall progress: {}%", view.progress);

    let policy = &session.policy;
    for summary in &view.addresses {
        let progress = summary.aggregate();
        println!(
            "\n{} [{}] {:.0}%  done {} / not done {} / not home {}",
            summary.address.name,
            summary.map_id(),
            progress,
            summary.done(),
            summary.notdone(),
            summary.nothome()
        );
        for floor in &summary.floors {
            let cells: Vec<String> = floor
                .units
                .iter()
                .map(|unit| {
                    let marker = match policy.unit_color(unit, progress) {
                        COLOR_AVAILABLE_HIGHLIGHT => '!',
                        COLOR_AVAILABLE => '*',
                        _ => ' ',
                    };
                    format!("{}{}", summary.padded_number(unit), marker)
                })
                .collect();
            println!("  {:>3} | {}", floor.floor, cells.join(" "));
        }
    }

    let now = chrono::Utc::now();
    let active: Vec<&LinkSession> = view.active_links(now).collect();
    println!("\nActive links: {} of {}", active.len(), view.links.len());
    for link in active {
        let remaining = link.remaining(now);
        println!(
            "  {} map {} by {} ({}h {}m left)",
            link.id,
            link.map,
            link.publisher_name,
            remaining.num_hours(),
            remaining.num_minutes() % 60
        );
    }

    Ok(())
}
