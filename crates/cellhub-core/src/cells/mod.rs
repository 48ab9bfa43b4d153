//! Compiled-in cell implementations.
//!
//! Module manifests only carry metadata; the process function for a cell is
//! looked up here by id. Each built-in also ships a default config, which is
//! what the registry falls back to when discovery finds nothing.
//!
//! # Module Structure
//!
//! - `fast_math` - lookup-table sine/cosine
//! - `pid_controller` - fixed-point PID step
//! - `error_handler` - hex error-code triage
//! - `lidar_compress` - delta encoding of range scans
//! - `motor_model` - DC motor current estimate
//! - `solar_planner` - insolation estimate
//! - `battery_optimization` - Li-ion degradation estimate

mod battery_optimization;
mod error_handler;
mod fast_math;
mod lidar_compress;
mod motor_model;
mod pid_controller;
mod solar_planner;

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::cell::{CellModule, CellProcess};
use crate::error::{Error, Result};
use crate::schema::CellConfig;

/// Cell ids substituted when no discovery candidate lists any module.
pub const FALLBACK_CELL_IDS: &[&str] = &["fast_math", "pid_controller", "error_handler"];

struct CatalogEntry {
    default_config: CellConfig,
    process: Arc<dyn CellProcess>,
}

/// Process functions available for binding, keyed by cell id.
#[derive(Default)]
pub struct CellCatalog {
    entries: FxHashMap<String, CatalogEntry>,
}

impl CellCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog with every built-in cell registered.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(fast_math::config(), Arc::new(fast_math::process));
        catalog.register(pid_controller::config(), Arc::new(pid_controller::process));
        catalog.register(error_handler::config(), Arc::new(error_handler::process));
        catalog.register(lidar_compress::config(), Arc::new(lidar_compress::process));
        catalog.register(motor_model::config(), Arc::new(motor_model::process));
        catalog.register(solar_planner::config(), Arc::new(solar_planner::process));
        catalog.register(
            battery_optimization::config(),
            Arc::new(battery_optimization::process),
        );
        catalog
    }

    /// Register a process under its default config's id.
    ///
    /// Replaces any earlier registration with the same id.
    pub fn register(&mut self, default_config: CellConfig, process: Arc<dyn CellProcess>) {
        self.entries.insert(
            default_config.id.clone(),
            CatalogEntry {
                default_config,
                process,
            },
        );
    }

    /// Whether a process is registered for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Bind a manifest config to its compiled-in process.
    ///
    /// Fails when the config violates the schema invariants or no process
    /// is registered under its id.
    pub fn bind(&self, config: CellConfig) -> Result<CellModule> {
        config.validate()?;
        let entry = self.entries.get(&config.id).ok_or_else(|| {
            Error::module_load(
                config.id.clone(),
                "no compiled-in process for this cell id",
            )
        })?;
        Ok(CellModule::new(config, entry.process.clone()))
    }

    /// Build a module from the built-in default config.
    pub fn default_module(&self, id: &str) -> Result<CellModule> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| Error::CellNotFound(id.to_string()))?;
        Ok(CellModule::new(
            entry.default_config.clone(),
            entry.process.clone(),
        ))
    }
}
