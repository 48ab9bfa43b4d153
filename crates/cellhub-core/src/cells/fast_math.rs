//! Lookup-table trigonometry at 0.1° resolution.

use std::sync::LazyLock;

use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64};
use crate::schema::{CellConfig, InputSpec};

/// Table entries per full turn.
const STEPS: usize = 3600;

/// `sin` in thousandths, one entry per tenth of a degree.
static SIN_LUT: LazyLock<Vec<i32>> = LazyLock::new(|| {
    (0..STEPS)
        .map(|i| ((std::f64::consts::PI * i as f64 / 1800.0).sin() * 1000.0).round() as i32)
        .collect()
});

pub fn config() -> CellConfig {
    CellConfig {
        id: "fast_math".to_string(),
        name: "Fast Trigonometry".to_string(),
        category: "utils".to_string(),
        description: "High-speed sin/cos calculations".to_string(),
        inputs: vec![InputSpec::number("angle", "Angle (degrees)").with_default(45)],
    }
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let angle = input_f64(inputs, "angle")?.rem_euclid(360.0);
    let idx = ((angle * 10.0).floor() as usize) % STEPS;

    Ok(json!({
        "sin": SIN_LUT[idx] as f64 / 1000.0,
        "cos": SIN_LUT[(idx + 900) % STEPS] as f64 / 1000.0,
    }))
}
