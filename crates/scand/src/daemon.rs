//! Engine wiring and lifecycle
//!
//! Builds one engine per configured interface on top of the simulated radio
//! collaborators and runs each engine's event loop until shutdown.

use crate::config::DaemonConfig;
use anyhow::Result;
use scan_engine::{
    event_channel,
    sim::{SimulatedOffload, SimulatedRadio},
    CapabilityModel, EngineRegistry, HealthRegistry, ScanEngine,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Running engines and the handles needed to drive and stop them
pub struct Daemon {
    pub registry: Arc<EngineRegistry>,
    pub offloads: Arc<HashMap<String, Arc<SimulatedOffload>>>,
    shutdown: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Daemon {
    /// Build every interface's engine and spawn its event loop
    pub async fn start(config: &DaemonConfig, health: HealthRegistry) -> Result<Self> {
        let (shutdown, _) = broadcast::channel(1);
        let registry = Arc::new(EngineRegistry::new());
        let mut offloads = HashMap::new();
        let mut tasks = Vec::new();

        for iface in config.effective_interfaces() {
            let (events_tx, events_rx) = event_channel();
            let radio = Arc::new(SimulatedRadio::new(events_tx.clone()));
            let offload = Arc::new(SimulatedOffload::new(events_tx, iface.offload_supported));

            let engine = Arc::new(
                ScanEngine::builder()
                    .interface(iface.info())
                    .transport(radio)
                    .offload(offload.clone())
                    .capabilities(CapabilityModel::new(iface.capabilities, iface.features))
                    .schedule_policy(config.schedule)
                    .health(health.clone())
                    .build()?,
            );
            registry.insert(engine.clone())?;
            engine.register_health().await;
            offloads.insert(iface.name.clone(), offload);

            info!(
                interface = %iface.name,
                index = iface.index,
                offload_supported = iface.offload_supported,
                "Interface engine started"
            );
            tasks.push(tokio::spawn(engine.run(events_rx, shutdown.subscribe())));
        }

        Ok(Self {
            registry,
            offloads: Arc::new(offloads),
            shutdown,
            tasks,
        })
    }

    /// Stop background scans, then the event loops
    pub async fn shutdown(self) {
        let failures = self.registry.stop_all_pno().await;
        if failures > 0 {
            warn!(failures, "Some interfaces failed to stop PNO");
        }

        let _ = self.shutdown.send(());
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Engine event loop ended abnormally");
            }
        }
        info!("All interface engines stopped");
    }
}
