//! Hex error-code triage.

use anyhow::Context;
use serde_json::{Value, json};

use crate::cell::{InputMap, input_str};
use crate::schema::{CellConfig, InputSpec};

/// Recovery actions keyed by fault class (low nibble).
const ACTIONS: &[(u32, &str)] = &[
    (0x01, "Motor driver fault - restart driver"),
    (0x02, "Low voltage - reduce speed by 30%"),
];

const DEFAULT_ACTION: &str = "Check connections";

pub fn config() -> CellConfig {
    CellConfig {
        id: "error_handler".to_string(),
        name: "Error Handler".to_string(),
        category: "utils".to_string(),
        description: "Fault recovery system".to_string(),
        inputs: vec![InputSpec::text("error_code", "Error Code").with_default("0x21")],
    }
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let raw = input_str(inputs, "error_code")?.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    let code = u32::from_str_radix(digits, 16)
        .with_context(|| format!("'{}' is not a hexadecimal error code", raw))?;

    let action = ACTIONS
        .iter()
        .find(|(class, _)| *class == code & 0x0F)
        .map(|(_, action)| *action)
        .unwrap_or(DEFAULT_ACTION);

    Ok(json!({
        "severity": (code >> 4) & 0x0F,
        "action": action,
        "log_code": format!("ERR{:02X}", code),
    }))
}
