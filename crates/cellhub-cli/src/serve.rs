//! Serve command implementation for the CellHub CLI.
//!
//! Discovers cells and starts the HTTP and WebSocket server.

use cellhub_core::HubConfig;
use cellhub_server::ServerConfig;

use crate::colors;
use crate::output::print_source;

/// Start the server.
pub async fn execute(config: &HubConfig) -> anyhow::Result<()> {
    let registry = crate::discover(config).await;

    println!("\n{}CellHub Server{} - Cell Runner", colors::BOLD, colors::RESET);
    println!("{}", "─".repeat(50));

    print_source(&registry);

    let server_config = ServerConfig {
        host: config.host.clone(),
        port: config.port,
        companion_url: config.companion_url.clone(),
        probe_interval: config.probe_interval(),
    };

    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        server_config.host,
        server_config.port
    );
    println!(
        "{}  ◆ WebSocket:{} ws://{}:{}/ws",
        colors::CYAN,
        colors::RESET,
        server_config.host,
        server_config.port
    );
    if let Some(url) = &server_config.companion_url {
        println!("{}  ◆ Companion:{} {}", colors::CYAN, colors::RESET, url);
    }
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    cellhub_server::serve(registry, server_config).await?;

    Ok(())
}
