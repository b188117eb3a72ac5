//! Per-interface scan engine
//!
//! Serializes every boundary operation and every collaborator event for one
//! interface behind a single async mutex, held for the whole operation
//! including the collaborator call. Events arrive on a channel and are
//! applied by [`ScanEngine::run`].

use crate::capabilities::CapabilityModel;
use crate::error::EngineError;
use crate::events::{EventReceiver, KernelScanEvent, OffloadEvent, RadioEvent};
use crate::health::{components, HealthRegistry};
use crate::models::{EngineStatus, InterfaceInfo, PnoRequest, ScanResult, SingleScanRequest};
use crate::pno::PnoController;
use crate::scanner::{AbortOnFatal, FatalErrorHandler, ScanScheduler};
use crate::schedule::SchedulePolicy;
use crate::transport::{KernelScanTransport, NoOffload, OffloadEngine};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

struct EngineInner {
    scanner: ScanScheduler,
    pno: PnoController,
}

/// Scan scheduling and PNO control for one interface
pub struct ScanEngine {
    interface: InterfaceInfo,
    capabilities: CapabilityModel,
    health: HealthRegistry,
    inner: Mutex<EngineInner>,
}

impl ScanEngine {
    pub fn builder() -> ScanEngineBuilder {
        ScanEngineBuilder::new()
    }

    pub fn interface(&self) -> &InterfaceInfo {
        &self.interface
    }

    pub fn capabilities(&self) -> &CapabilityModel {
        &self.capabilities
    }

    /// Register this interface's components as healthy
    pub async fn register_health(&self) {
        for component in [components::SCANNER, components::PNO, components::OFFLOAD] {
            self.health
                .register(&components::for_interface(&self.interface.name, component))
                .await;
        }
    }

    /// Remove this interface's components from the health registry
    pub async fn unregister_health(&self) {
        for component in [components::SCANNER, components::PNO, components::OFFLOAD] {
            self.health
                .unregister(&components::for_interface(&self.interface.name, component))
                .await;
        }
    }

    pub async fn scan(&self, request: &SingleScanRequest) -> bool {
        let mut inner = self.inner.lock().await;
        inner.scanner.scan(request).await
    }

    pub async fn abort_scan(&self) -> bool {
        let mut inner = self.inner.lock().await;
        inner.scanner.abort().await
    }

    pub async fn get_scan_results(&self) -> Vec<ScanResult> {
        let inner = self.inner.lock().await;
        inner.scanner.scan_results().await
    }

    pub async fn start_pno_scan(&self, request: PnoRequest) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.scanner.is_defunct() {
            warn!(interface = %self.interface.name, "PNO start on defunct interface");
            return false;
        }
        inner.pno.start(request).await
    }

    pub async fn stop_pno_scan(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.scanner.is_defunct() {
            return false;
        }
        inner.pno.stop().await
    }

    pub async fn get_pno_scan_results(&self) -> Vec<ScanResult> {
        let inner = self.inner.lock().await;
        if inner.scanner.is_defunct() {
            return Vec::new();
        }
        inner.pno.results()
    }

    pub async fn status(&self) -> EngineStatus {
        let inner = self.inner.lock().await;
        EngineStatus {
            interface: self.interface.name.clone(),
            interface_index: self.interface.index,
            active_scan: inner.scanner.is_scan_pending(),
            pno_backend: inner.pno.active_backend(),
            defunct: inner.scanner.is_defunct(),
        }
    }

    /// Apply one collaborator event under the interface lock
    pub async fn handle_event(&self, event: RadioEvent) {
        let mut inner = self.inner.lock().await;
        debug!(interface = %self.interface.name, event = ?event, "Radio event");

        match event {
            RadioEvent::Kernel(kernel) => {
                inner.scanner.on_kernel_event(kernel);
                match kernel {
                    KernelScanEvent::SchedScanResultsReady => {
                        inner.pno.on_sched_scan_results().await;
                    }
                    KernelScanEvent::SchedScanStopped => {
                        info!(
                            interface = %self.interface.name,
                            "Kernel reported scheduled scan stopped"
                        );
                    }
                    KernelScanEvent::ScanResultsReady | KernelScanEvent::ScanAborted => {}
                }
            }
            RadioEvent::Offload(OffloadEvent::ScanResultsAvailable) => {
                inner.pno.on_offload_results().await;
            }
            RadioEvent::Offload(OffloadEvent::Error(reason)) => {
                inner.pno.on_offload_error(reason).await;
            }
        }
    }

    /// Drain collaborator events until shutdown or until every sender is gone
    pub async fn run(
        self: Arc<Self>,
        mut events: EventReceiver,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(interface = %self.interface.name, "Starting scan engine event loop");

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            info!(interface = %self.interface.name, "Event channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!(interface = %self.interface.name, "Shutting down scan engine event loop");
                    break;
                }
            }
        }
    }
}

/// Builder for a [`ScanEngine`]
pub struct ScanEngineBuilder {
    interface: Option<InterfaceInfo>,
    transport: Option<Arc<dyn KernelScanTransport>>,
    offload: Option<Arc<dyn OffloadEngine>>,
    capabilities: CapabilityModel,
    policy: SchedulePolicy,
    fatal_handler: Option<Arc<dyn FatalErrorHandler>>,
    health: Option<HealthRegistry>,
}

impl ScanEngineBuilder {
    pub fn new() -> Self {
        Self {
            interface: None,
            transport: None,
            offload: None,
            capabilities: CapabilityModel::default(),
            policy: SchedulePolicy::default(),
            fatal_handler: None,
            health: None,
        }
    }

    pub fn interface(mut self, interface: InterfaceInfo) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Set the kernel scan transport
    pub fn transport(mut self, transport: Arc<dyn KernelScanTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the offload engine (defaults to none)
    pub fn offload(mut self, offload: Arc<dyn OffloadEngine>) -> Self {
        self.offload = Some(offload);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilityModel) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn schedule_policy(mut self, policy: SchedulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the fatal error handler (defaults to aborting the process)
    pub fn fatal_handler(mut self, handler: Arc<dyn FatalErrorHandler>) -> Self {
        self.fatal_handler = Some(handler);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Result<ScanEngine> {
        let interface = self
            .interface
            .ok_or(EngineError::MissingComponent("Interface"))?;
        let transport = self
            .transport
            .ok_or(EngineError::MissingComponent("Kernel scan transport"))?;
        let offload = self.offload.unwrap_or_else(|| Arc::new(NoOffload));
        let fatal_handler = self
            .fatal_handler
            .unwrap_or_else(|| Arc::new(AbortOnFatal));
        let health = self.health.unwrap_or_default();

        let scanner = ScanScheduler::new(
            interface.clone(),
            transport.clone(),
            self.capabilities,
            fatal_handler,
            health.clone(),
        );
        let pno = PnoController::new(
            interface.clone(),
            transport,
            offload,
            self.capabilities,
            self.policy,
            health.clone(),
        );

        Ok(ScanEngine {
            interface,
            capabilities: self.capabilities,
            health,
            inner: Mutex::new(EngineInner { scanner, pno }),
        })
    }
}

impl Default for ScanEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
