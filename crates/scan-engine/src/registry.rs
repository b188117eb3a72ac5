//! Registry of per-interface engines

use crate::engine::ScanEngine;
use crate::error::EngineError;
use crate::models::EngineStatus;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engines keyed by interface name
#[derive(Default)]
pub struct EngineRegistry {
    engines: DashMap<String, Arc<ScanEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: DashMap::new(),
        }
    }

    /// Register an engine under its interface name
    pub fn insert(&self, engine: Arc<ScanEngine>) -> Result<(), EngineError> {
        let name = engine.interface().name.clone();
        match self.engines.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(EngineError::DuplicateInterface(name))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!(interface = %name, "Registering scan engine");
                slot.insert(engine);
                Ok(())
            }
        }
    }

    pub fn get(&self, interface: &str) -> Result<Arc<ScanEngine>, EngineError> {
        self.engines
            .get(interface)
            .map(|r| r.value().clone())
            .ok_or_else(|| EngineError::UnknownInterface(interface.to_string()))
    }

    pub fn remove(&self, interface: &str) -> Option<Arc<ScanEngine>> {
        debug!(interface = %interface, "Removing scan engine");
        self.engines.remove(interface).map(|(_, v)| v)
    }

    /// Interface names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<ScanEngine>> {
        let mut engines: Vec<Arc<ScanEngine>> =
            self.engines.iter().map(|r| r.value().clone()).collect();
        engines.sort_by(|a, b| a.interface().name.cmp(&b.interface().name));
        engines
    }

    /// Status of every engine, sorted by interface name
    pub async fn statuses(&self) -> Vec<EngineStatus> {
        let mut statuses = Vec::with_capacity(self.len());
        for engine in self.snapshot() {
            statuses.push(engine.status().await);
        }
        statuses
    }

    /// Stop PNO on every interface, returning how many stops failed
    pub async fn stop_all_pno(&self) -> usize {
        let mut failures = 0;
        for engine in self.snapshot() {
            if engine.status().await.pno_backend.is_active() && !engine.stop_pno_scan().await {
                warn!(interface = %engine.interface().name, "Failed to stop PNO during shutdown");
                failures += 1;
            }
        }
        failures
    }
}
