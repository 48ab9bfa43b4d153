//! Module registry and discovery.
//!
//! Discovery walks an ordered list of candidate locations and loads every
//! module manifest from the first candidate that lists any. Individual load
//! failures are logged and skipped; when no candidate lists anything, the
//! fallback set of built-in cells is used instead, so discovery never fails
//! and never yields an empty registry on that path.
//!
//! ```text
//! candidates ──► first non-empty listing ──► load all (concurrently)
//!      │                                         │
//!      └── all empty ──► FALLBACK_CELL_IDS ──────┴──► Registry (read-only)
//! ```
//!
//! Duplicate ids overwrite earlier entries in listing order: the last
//! loaded module wins.

mod listing;

pub use listing::{ModuleLocation, extract_module_names, fetch_module, list_modules};

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;

use crate::cell::CellModule;
use crate::cells::{CellCatalog, FALLBACK_CELL_IDS};
use crate::error::{Error, Result};
use crate::schema::CellConfig;

/// Default module file extension.
pub const DEFAULT_MODULE_EXTENSION: &str = "json";

/// Discovery settings.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Candidate bases, tried in order.
    pub candidates: Vec<ModuleLocation>,
    /// Module file extension, without the dot.
    pub extension: String,
    /// Cell ids used when no candidate lists any module.
    pub fallback_ids: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            candidates: vec![ModuleLocation::Directory("cells".into())],
            extension: DEFAULT_MODULE_EXTENSION.to_string(),
            fallback_ids: FALLBACK_CELL_IDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Where the registry contents came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Loaded from the listed candidate.
    Candidate(ModuleLocation),
    /// No candidate listed anything; built-in fallback set.
    Fallback,
    /// Built directly from modules.
    Static,
}

/// A manifest file: either the bare config or `{ "config": { ... } }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    Wrapped { config: CellConfig },
    Bare(CellConfig),
}

impl Manifest {
    fn into_config(self) -> CellConfig {
        match self {
            Manifest::Wrapped { config } | Manifest::Bare(config) => config,
        }
    }
}

/// Indexed cells, keyed by id. Read-only once built.
#[derive(Debug, Clone)]
pub struct Registry {
    cells: BTreeMap<String, Arc<CellModule>>,
    source: RegistrySource,
}

impl Registry {
    /// Build a registry from already-loaded modules.
    ///
    /// Later modules replace earlier ones with the same id.
    pub fn from_modules(modules: impl IntoIterator<Item = CellModule>) -> Self {
        let mut registry = Self {
            cells: BTreeMap::new(),
            source: RegistrySource::Static,
        };
        for module in modules {
            registry.insert(module, "static");
        }
        registry
    }

    /// Run discovery and build the registry.
    pub async fn discover(config: &DiscoveryConfig, catalog: &CellCatalog) -> Self {
        let client = reqwest::Client::new();
        Self::discover_with_client(&client, config, catalog).await
    }

    /// Run discovery with a caller-provided HTTP client.
    pub async fn discover_with_client(
        client: &reqwest::Client,
        config: &DiscoveryConfig,
        catalog: &CellCatalog,
    ) -> Self {
        for location in &config.candidates {
            match list_modules(client, location, &config.extension).await {
                Ok(names) if !names.is_empty() => {
                    tracing::info!("Discovered {} module(s) at {}", names.len(), location);
                    return Self::load_all(client, location, &names, catalog).await;
                }
                Ok(_) => {
                    tracing::debug!("No modules listed at {}", location);
                }
                Err(e) => {
                    tracing::warn!("Discovery candidate {} failed: {}", location, e);
                }
            }
        }

        tracing::warn!(
            "No discovery candidate listed any module, using fallback cells: {}",
            config.fallback_ids.join(", ")
        );
        Self::fallback(&config.fallback_ids, catalog)
    }

    /// Load every listed module from `location`, all in flight at once.
    async fn load_all(
        client: &reqwest::Client,
        location: &ModuleLocation,
        names: &[String],
        catalog: &CellCatalog,
    ) -> Self {
        let loads = names
            .iter()
            .map(|name| load_module(client, location, name, catalog));
        let results = join_all(loads).await;

        let mut registry = Self {
            cells: BTreeMap::new(),
            source: RegistrySource::Candidate(location.clone()),
        };
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(module) => registry.insert(module, name),
                Err(e) => tracing::warn!("Skipping module {}: {}", name, e),
            }
        }

        tracing::info!("Registry ready with {} cell(s)", registry.len());
        registry
    }

    /// Build the registry from the built-in default configs.
    fn fallback(ids: &[String], catalog: &CellCatalog) -> Self {
        let mut registry = Self {
            cells: BTreeMap::new(),
            source: RegistrySource::Fallback,
        };
        for id in ids {
            match catalog.default_module(id) {
                Ok(module) => registry.insert(module, id),
                Err(e) => tracing::warn!("Skipping fallback cell {}: {}", id, e),
            }
        }
        registry
    }

    fn insert(&mut self, module: CellModule, origin: &str) {
        let id = module.id().to_string();
        if self.cells.insert(id.clone(), Arc::new(module)).is_some() {
            tracing::info!("Cell {} redefined by {}; last loaded wins", id, origin);
        }
    }

    /// Look up a cell.
    pub fn get(&self, id: &str) -> Result<Arc<CellModule>> {
        self.cells
            .get(id)
            .cloned()
            .ok_or_else(|| Error::CellNotFound(id.to_string()))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        self.cells.keys().map(String::as_str).collect()
    }

    /// Configs of all registered cells, sorted by id.
    pub fn configs(&self) -> Vec<&CellConfig> {
        self.cells.values().map(|c| c.config()).collect()
    }

    /// Number of registered cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the registry holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Where the contents came from.
    pub fn source(&self) -> &RegistrySource {
        &self.source
    }
}

/// Fetch, parse and bind one module manifest.
pub async fn load_module(
    client: &reqwest::Client,
    location: &ModuleLocation,
    filename: &str,
    catalog: &CellCatalog,
) -> Result<CellModule> {
    let text = fetch_module(client, location, filename).await?;
    let manifest: Manifest = serde_json::from_str(&text)
        .map_err(|e| Error::module_load(filename, format!("malformed manifest: {}", e)))?;
    catalog.bind(manifest.into_config())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn discovery(candidates: Vec<ModuleLocation>) -> DiscoveryConfig {
        DiscoveryConfig {
            candidates,
            ..DiscoveryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_loads_directory_candidate() {
        let dir = tempfile::TempDir::new().unwrap();
        write(
            dir.path(),
            "fast_math.json",
            r#"{ "id": "fast_math", "name": "Trig", "inputs": [
                 { "id": "angle", "label": "Angle", "type": "number", "value": 30 } ] }"#,
        );
        write(
            dir.path(),
            "pid.json",
            r#"{ "config": { "id": "pid_controller", "name": "PID" } }"#,
        );

        let config = discovery(vec![ModuleLocation::Directory(dir.path().to_path_buf())]);
        let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

        assert_eq!(registry.ids(), vec!["fast_math", "pid_controller"]);
        assert_eq!(registry.get("fast_math").unwrap().config().name, "Trig");
        assert!(matches!(registry.source(), RegistrySource::Candidate(_)));
    }

    #[tokio::test]
    async fn test_bad_modules_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "a_broken.json", "{ not json");
        write(dir.path(), "b_unknown.json", r#"{ "id": "teleport", "name": "Teleport" }"#);
        write(
            dir.path(),
            "c_bad_schema.json",
            r#"{ "id": "motor_model", "name": "Motor", "inputs": [
                 { "id": "m", "label": "M", "type": "select", "options": [] } ] }"#,
        );
        write(dir.path(), "d_good.json", r#"{ "id": "error_handler", "name": "Errors" }"#);

        let config = discovery(vec![ModuleLocation::Directory(dir.path().to_path_buf())]);
        let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

        assert_eq!(registry.ids(), vec!["error_handler"]);
    }

    #[tokio::test]
    async fn test_first_non_empty_candidate_wins() {
        let empty = tempfile::TempDir::new().unwrap();
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        write(first.path(), "fast_math.json", r#"{ "id": "fast_math", "name": "First" }"#);
        write(second.path(), "solar.json", r#"{ "id": "solar_planner", "name": "Second" }"#);

        let config = discovery(vec![
            ModuleLocation::Directory("/nonexistent/cellhub".into()),
            ModuleLocation::Directory(empty.path().to_path_buf()),
            ModuleLocation::Directory(first.path().to_path_buf()),
            ModuleLocation::Directory(second.path().to_path_buf()),
        ]);
        let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

        assert_eq!(registry.ids(), vec!["fast_math"]);
        assert_eq!(
            registry.source(),
            &RegistrySource::Candidate(ModuleLocation::Directory(first.path().to_path_buf()))
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_last_loaded_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{ "id": "fast_math", "name": "Alpha" }"#);
        write(dir.path(), "b.json", r#"{ "id": "fast_math", "name": "Beta" }"#);

        let config = discovery(vec![ModuleLocation::Directory(dir.path().to_path_buf())]);
        let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("fast_math").unwrap().config().name, "Beta");
    }

    #[tokio::test]
    async fn test_all_empty_uses_fallback() {
        let empty = tempfile::TempDir::new().unwrap();
        let config = discovery(vec![
            ModuleLocation::Directory(empty.path().to_path_buf()),
            ModuleLocation::Directory("/nonexistent/cellhub".into()),
        ]);
        let registry = Registry::discover(&config, &CellCatalog::builtin()).await;

        assert_eq!(registry.source(), &RegistrySource::Fallback);
        assert!(!registry.is_empty());
        for id in FALLBACK_CELL_IDS {
            assert!(registry.contains(id));
        }
    }

    #[tokio::test]
    async fn test_no_candidates_uses_fallback() {
        let registry = Registry::discover(&discovery(Vec::new()), &CellCatalog::builtin()).await;
        assert_eq!(registry.len(), FALLBACK_CELL_IDS.len());
    }

    #[test]
    fn test_get_unknown() {
        let registry = Registry::from_modules(Vec::new());
        assert!(matches!(registry.get("nope"), Err(Error::CellNotFound(_))));
    }
}
