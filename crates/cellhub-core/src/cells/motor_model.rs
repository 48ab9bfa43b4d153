//! Steady-state DC motor current estimate: `I = (V - kt·ω) / R + I0`.

use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64, input_str};
use crate::schema::{CellConfig, InputSpec};

struct MotorParams {
    kt: f64,
    resistance: f64,
    no_load_current: f64,
}

fn params(motor: &str) -> Option<MotorParams> {
    match motor {
        "maxon_ec45" => Some(MotorParams {
            kt: 0.042,
            resistance: 2.3,
            no_load_current: 0.1,
        }),
        _ => None,
    }
}

/// Current draw above which the result carries a warning.
const WARN_CURRENT_A: f64 = 2.0;

pub fn config() -> CellConfig {
    CellConfig {
        id: "motor_model".to_string(),
        name: "Motor Model".to_string(),
        category: "power".to_string(),
        description: "Current/power estimation".to_string(),
        inputs: vec![
            InputSpec::select("motor_type", "Motor Type", &["maxon_ec45"]).with_default("maxon_ec45"),
            InputSpec::number("voltage", "Voltage (V)").with_default(12.6),
            InputSpec::number("rpm", "RPM").with_default(3500),
        ],
    }
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let motor = input_str(inputs, "motor_type")?;
    let Some(p) = params(motor) else {
        anyhow::bail!("unknown motor type '{}'", motor);
    };
    let voltage = input_f64(inputs, "voltage")?;
    let rpm = input_f64(inputs, "rpm")?;

    let current = (voltage - p.kt * rpm) / p.resistance + p.no_load_current;
    let current = (current * 100.0).round() / 100.0;

    Ok(json!({
        "current_a": current,
        "warn": current > WARN_CURRENT_A,
    }))
}
