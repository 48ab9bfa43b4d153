//! One step of a PID loop in Q15 fixed point.

use anyhow::bail;
use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64, input_f64_or};
use crate::schema::{CellConfig, InputSpec};

const Q15: f64 = 32768.0;

// Gains 1.0, 0.05 and 0.2 in Q15.
const KP: i128 = 32768;
const KI: i128 = 1638;
const KD: i128 = 6553;

pub fn config() -> CellConfig {
    CellConfig {
        id: "pid_controller".to_string(),
        name: "PID Controller".to_string(),
        category: "motion".to_string(),
        description: "Motor control loop".to_string(),
        inputs: vec![
            InputSpec::number("error", "Error").with_default(0.5),
            InputSpec::number("integral", "Integral").with_default(0),
            InputSpec::number("last_error", "Last Error").with_default(0),
        ],
    }
}

/// Scale to Q15. Values that do not fit 64 bits are rejected rather than
/// saturated.
fn to_q15(id: &str, value: f64) -> anyhow::Result<i128> {
    let scaled = (value * Q15).round();
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        bail!("{} is out of range for Q15: {}", id, value);
    }
    Ok(scaled as i128)
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let error = to_q15("error", input_f64(inputs, "error")?)?;
    let last_error = to_q15("last_error", input_f64_or(inputs, "last_error", 0.0)?)?;
    let integral = to_q15("integral", input_f64_or(inputs, "integral", 0.0)?)?;

    // Anti-windup: the accumulator saturates at 32 bits.
    let integral = (integral + error).clamp(i32::MIN as i128, i32::MAX as i128);
    let derivative = error - last_error;

    // Operands are below 2^63 and gains below 2^16, so the sum fits i128.
    let output = (KP * error + KI * integral + KD * derivative).div_euclid(32768);

    Ok(json!({
        "output": output as f64 / Q15,
        "integral": integral as f64 / Q15,
        "last_error": error as f64 / Q15,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(error: f64, integral: f64, last_error: f64) -> InputMap {
        json!({ "error": error, "integral": integral, "last_error": last_error })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_proportional_dominates_first_step() {
        let out = process(&inputs(0.5, 0.0, 0.0)).unwrap();
        assert_eq!(out["integral"], json!(0.5));
        assert_eq!(out["last_error"], json!(0.5));

        // 0.5 * (1.0 + 0.05 + 0.2), minus Q15 truncation of the gains
        let output = out["output"].as_f64().unwrap();
        assert!((output - 0.625).abs() < 1e-3, "output {}", output);
    }

    #[test]
    fn test_zero_error_is_zero_output() {
        let out = process(&inputs(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(out["output"], json!(0.0));
    }

    #[test]
    fn test_large_error_does_not_overflow() {
        let out = process(&inputs(1e10, 0.0, 0.0)).unwrap();
        assert_eq!(out["last_error"], json!(1e10));
        // The integral term saturates; proportional and derivative dominate.
        let output = out["output"].as_f64().unwrap();
        assert!((output - 1.2e10).abs() / 1.2e10 < 1e-3, "output {}", output);

        let out = process(&inputs(-1e12, 0.0, 1e12)).unwrap();
        assert!(out["output"].as_f64().unwrap() < -1e12);
    }

    #[test]
    fn test_out_of_range_error_is_rejected() {
        let err = process(&inputs(1e300, 0.0, 0.0)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_missing_error_fails() {
        assert!(process(&InputMap::new()).is_err());
    }
}
