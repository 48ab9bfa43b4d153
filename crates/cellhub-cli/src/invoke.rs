//! Invoke command implementation for the CellHub CLI.
//!
//! Runs one cell headlessly. The query string takes the same parameters as
//! a headless HTTP request. The `headless` marker is implied, and an
//! explicit `headless=0` is overridden since this command has no form.

use std::sync::Arc;

use cellhub_core::mode::HEADLESS_PARAM;
use cellhub_core::{Dispatcher, HubConfig, InvocationContext, InvocationMode, run_headless, select_mode};

/// Invoke a cell and print the response body.
pub async fn execute(config: &HubConfig, query: &str) -> anyhow::Result<()> {
    let query = query.trim_start_matches('?');
    let mut ctx = InvocationContext::from_query(query);
    if !ctx.headless_requested() {
        // Repeated keys resolve to the last occurrence.
        ctx = InvocationContext::from_query(&format!("{}&{}=1", query, HEADLESS_PARAM));
    }

    let InvocationMode::Headless(invocation) = select_mode(&ctx) else {
        anyhow::bail!("Query must name a cell, e.g. \"cell=fast_math&angle=45\"");
    };

    let registry = crate::discover(config).await;
    let dispatcher = Dispatcher::new(Arc::new(registry));
    let response = run_headless(&dispatcher, invocation).await;

    if response.is_success() {
        println!("{}", response.body);
        Ok(())
    } else {
        eprintln!("{}", response.body);
        anyhow::bail!("Invocation failed with status {}", response.status)
    }
}
