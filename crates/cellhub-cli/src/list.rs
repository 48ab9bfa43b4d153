//! List command implementation for the CellHub CLI.

use cellhub_core::HubConfig;

use crate::colors;
use crate::output::{print_cell, print_source};

/// List discovered cells.
pub async fn execute(config: &HubConfig, json: bool) -> anyhow::Result<()> {
    let registry = crate::discover(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&registry.configs())?);
        return Ok(());
    }

    println!("\n{}CellHub{} - Registered Cells", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));
    print_source(&registry);

    for config in registry.configs() {
        print_cell(config);
    }
    println!();

    Ok(())
}
