//! Terminal output helpers.

use cellhub_core::{CellConfig, InputKind, Registry, RegistrySource};

use crate::colors;

/// Print where the registry came from.
pub fn print_source(registry: &Registry) {
    let source = match registry.source() {
        RegistrySource::Candidate(location) => location.to_string(),
        RegistrySource::Fallback => format!("{}built-in fallback{}", colors::YELLOW, colors::RESET),
        RegistrySource::Static => "static".to_string(),
    };
    println!("{}  ◆ Cells:{} {} from {}", colors::CYAN, colors::RESET, registry.len(), source);
}

/// Print one cell with its inputs.
pub fn print_cell(config: &CellConfig) {
    println!(
        "\n{}{}{} {}({}){}",
        colors::BOLD,
        config.id,
        colors::RESET,
        colors::DIM,
        config.category,
        colors::RESET
    );
    println!("  {}", config.name);
    if !config.description.is_empty() {
        println!("  {}{}{}", colors::DIM, config.description, colors::RESET);
    }

    for input in &config.inputs {
        let kind = match &input.kind {
            InputKind::Number {
                min: Some(min),
                max: Some(max),
            } => format!("number {}..{}", min, max),
            InputKind::Select { options } => format!("select [{}]", options.join(", ")),
            other => other.type_name().to_string(),
        };
        let default = input
            .default_as_raw()
            .map(|d| format!(" = {}", d))
            .unwrap_or_default();
        let required = if input.required { " (required)" } else { "" };
        println!(
            "    {}{}{}: {}{}{}",
            colors::CYAN,
            input.id,
            colors::RESET,
            kind,
            default,
            required
        );
    }
}
