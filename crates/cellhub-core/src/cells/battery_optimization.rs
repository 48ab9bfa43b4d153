//! Li-ion degradation estimate and load-shedding advice.

use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64_or};
use crate::schema::{CellConfig, InputSpec};

pub fn config() -> CellConfig {
    CellConfig {
        id: "battery_optimization".to_string(),
        name: "Battery Optimization".to_string(),
        category: "power".to_string(),
        description: "Power management".to_string(),
        inputs: vec![
            InputSpec::number("charge_cycles", "Charge Cycles").with_default(150),
            InputSpec::number("avg_dod", "Avg DoD %").with_default(80),
            InputSpec::number("avg_temp", "Avg Temp °C").with_default(35),
        ],
    }
}

/// Capacity loss in percent. Doubles every 10 °C above 25 °C.
fn degradation(cycles: f64, dod: f64, temp: f64) -> f64 {
    0.003 * cycles * (dod / 100.0) * 2f64.powf((temp - 25.0) / 10.0)
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let cycles = input_f64_or(inputs, "charge_cycles", 50.0)?;
    let dod = input_f64_or(inputs, "avg_dod", 80.0)?;
    let temp = input_f64_or(inputs, "avg_temp", 30.0)?;

    let remaining = (100.0 - degradation(cycles, dod, temp)).max(0.0);
    let suggestion = if remaining < 60.0 {
        "disable_secondary_systems"
    } else if remaining < 80.0 {
        "reduce_max_speed_20%"
    } else {
        "normal"
    };

    Ok(json!({
        "battery_health": format!("{:.1}%", remaining),
        "suggestion": suggestion,
        "critical": remaining < 50.0,
    }))
}
