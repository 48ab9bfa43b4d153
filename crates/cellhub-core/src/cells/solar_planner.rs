//! Coarse insolation model for panel sizing.

use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64};
use crate::schema::{CellConfig, InputSpec};

pub fn config() -> CellConfig {
    CellConfig {
        id: "solar_planner".to_string(),
        name: "Solar Planner".to_string(),
        category: "power".to_string(),
        description: "Energy harvesting optimization".to_string(),
        inputs: vec![
            InputSpec::number("month", "Month (1-12)")
                .with_range(1.0, 12.0)
                .with_default(7),
            InputSpec::number("lat", "Latitude")
                .with_range(-90.0, 90.0)
                .with_default(37.7),
            InputSpec::number("panel_w", "Panel Watts").with_default(100),
        ],
    }
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let month = input_f64(inputs, "month")?;
    let latitude = input_f64(inputs, "lat")?;
    let panel_w = input_f64(inputs, "panel_w")?;

    let peak_hours = (4.5 - (latitude / 20.0 - month * 0.2).abs()).max(0.0);

    Ok(json!({
        "charge_hours": peak_hours,
        "recommended_usage": 0.8 * peak_hours * panel_w,
    }))
}
