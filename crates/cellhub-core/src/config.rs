//! Hub configuration.
//!
//! Read from a JSON file; every field is optional.
//!
//! ```json
//! {
//!   "candidates": [{ "http": "http://localhost:8080/cells/" }, { "directory": "cells" }],
//!   "port": 3000,
//!   "companion_url": "http://localhost:5000"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cells::FALLBACK_CELL_IDS;
use crate::error::{Error, Result};
use crate::registry::{DEFAULT_MODULE_EXTENSION, DiscoveryConfig, ModuleLocation};

/// Top-level configuration shared by the server and CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Discovery candidates, tried in order.
    pub candidates: Vec<ModuleLocation>,
    /// Module file extension.
    pub module_extension: String,
    /// Cells used when discovery finds nothing.
    pub fallback_ids: Vec<String>,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Companion backend base URL.
    pub companion_url: Option<String>,
    /// Seconds between companion liveness probes.
    pub probe_interval_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            candidates: vec![ModuleLocation::Directory("cells".into())],
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
            fallback_ids: FALLBACK_CELL_IDS.iter().map(|s| s.to_string()).collect(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            companion_url: None,
            probe_interval_secs: 30,
        }
    }
}

impl HubConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cellhub").join("config.json"))
    }

    /// Load from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Discovery settings.
    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            candidates: self.candidates.clone(),
            extension: self.module_extension.clone(),
            fallback_ids: self.fallback_ids.clone(),
        }
    }

    /// Companion probe interval.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.probe_interval(), Duration::from_secs(30));
        assert_eq!(config.discovery().fallback_ids.len(), 3);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "port": 8080, "candidates": [{ "http": "http://localhost:9000/cells" }] }"#,
        )
        .unwrap();

        let config = HubConfig::load(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(
            config.candidates,
            vec![ModuleLocation::Http("http://localhost:9000/cells".to_string())]
        );
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ port: }").unwrap();
        assert!(matches!(HubConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = HubConfig::resolve(Some(Path::new("/nonexistent/cellhub.json"))).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
