//! Delta encoding for LIDAR range scans.

use serde_json::{Value, json};

use crate::cell::{InputMap, input_f64_array};
use crate::schema::{CellConfig, InputSpec};

/// Deltas at or above this magnitude are stored as absolute ranges.
const DELTA_LIMIT: f64 = 5.0;

pub fn config() -> CellConfig {
    CellConfig {
        id: "lidar_compress".to_string(),
        name: "LIDAR Compression".to_string(),
        category: "perception".to_string(),
        description: "Scan data optimization".to_string(),
        inputs: vec![
            InputSpec::json("scan", "LIDAR Scan")
                .with_default("[1.2, 1.21, 1.19, 5.3, 5.31, 5.29]")
                .required(),
        ],
    }
}

pub fn process(inputs: &InputMap) -> anyhow::Result<Value> {
    let scan = input_f64_array(inputs, "scan")?;
    let Some(&first) = scan.first() else {
        anyhow::bail!("scan is empty");
    };

    let mut compressed = Vec::with_capacity(scan.len());
    compressed.push(first);
    for pair in scan.windows(2) {
        let delta = pair[1] - pair[0];
        compressed.push(if delta.abs() < DELTA_LIMIT { delta } else { pair[1] });
    }

    Ok(json!({
        "compressed_scan": compressed,
        "original_size": scan.len(),
    }))
}
