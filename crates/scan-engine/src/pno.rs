//! Background (PNO) scanning with offload fallback
//!
//! Two interchangeable backends run periodic scans: the hardware offload
//! engine and kernel scheduled scans. The controller prefers offload when
//! the hardware reports itself present, falls back to the kernel when
//! offload is missing or refuses, and switches over on its own when the
//! offload engine fails asynchronously. At most one backend runs at a time.

use crate::capabilities::{fit_to_limit, CapabilityModel};
use crate::events::OffloadFailure;
use crate::health::{components, HealthRegistry};
use crate::models::{InterfaceInfo, PnoBackendKind, PnoRequest, ScanResult};
use crate::observability::{ScanMetrics, StructuredLogger};
use crate::schedule::{SchedulePolicy, ScheduleResult};
use crate::transport::{KernelScanTransport, OffloadEngine, SchedScanRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Common surface of the two background-scan backends
#[async_trait]
pub trait PnoBackend: Send + Sync {
    fn kind(&self) -> PnoBackendKind;

    async fn start(&self, request: &PnoRequest, schedule: &ScheduleResult) -> bool;

    async fn stop(&self) -> bool;

    async fn results(&self) -> Vec<ScanResult>;
}

/// Backend driving the hardware offload engine
pub struct OffloadBackend {
    engine: Arc<dyn OffloadEngine>,
}

impl OffloadBackend {
    pub fn new(engine: Arc<dyn OffloadEngine>) -> Self {
        Self { engine }
    }

    /// Asked on every start so that offload hardware appearing later is used
    pub fn is_supported(&self) -> bool {
        self.engine.is_supported()
    }
}

#[async_trait]
impl PnoBackend for OffloadBackend {
    fn kind(&self) -> PnoBackendKind {
        PnoBackendKind::Offload
    }

    async fn start(&self, request: &PnoRequest, schedule: &ScheduleResult) -> bool {
        match self.engine.start_scan(request, schedule).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Offload engine refused background scan");
                false
            }
        }
    }

    async fn stop(&self) -> bool {
        match self.engine.stop_scan().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to stop offload scan");
                false
            }
        }
    }

    async fn results(&self) -> Vec<ScanResult> {
        match self.engine.get_scan_results().await {
            Ok(raw) => raw.iter().map(ScanResult::from).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch offload scan results");
                Vec::new()
            }
        }
    }
}

/// Backend driving kernel scheduled scans over nl80211
pub struct NetlinkBackend {
    transport: Arc<dyn KernelScanTransport>,
    iface_index: u32,
    caps: CapabilityModel,
}

impl NetlinkBackend {
    pub fn new(
        transport: Arc<dyn KernelScanTransport>,
        iface_index: u32,
        caps: CapabilityModel,
    ) -> Self {
        Self {
            transport,
            iface_index,
            caps,
        }
    }

    /// Fit a PNO request into the driver's scheduled-scan limits
    pub fn sched_request(
        &self,
        request: &PnoRequest,
        schedule: &ScheduleResult,
    ) -> SchedScanRequest {
        SchedScanRequest {
            schedule: schedule.clone(),
            scan_ssids: fit_to_limit(
                &request.scan_ssids,
                self.caps.max_sched_scan_ssids(),
                "sched_scan_ssids",
            )
            .to_vec(),
            match_ssids: fit_to_limit(
                &request.match_ssids,
                self.caps.max_match_sets(),
                "match_sets",
            )
            .to_vec(),
            frequencies: request.frequencies.clone(),
            rssi_thresholds: request.rssi_thresholds,
            randomize_mac: self.caps.supports_random_mac_sched_scan(),
        }
    }
}

#[async_trait]
impl PnoBackend for NetlinkBackend {
    fn kind(&self) -> PnoBackendKind {
        PnoBackendKind::Netlink
    }

    async fn start(&self, request: &PnoRequest, schedule: &ScheduleResult) -> bool {
        let sched = self.sched_request(request, schedule);
        match self
            .transport
            .start_scheduled_scan(self.iface_index, &sched)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Kernel scheduled scan failed to start");
                false
            }
        }
    }

    async fn stop(&self) -> bool {
        match self.transport.stop_scheduled_scan(self.iface_index).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Kernel scheduled scan stop returned an error");
                false
            }
        }
    }

    async fn results(&self) -> Vec<ScanResult> {
        match self.transport.get_scan_results(self.iface_index).await {
            Ok(raw) => raw.iter().map(ScanResult::from).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch scheduled scan results");
                Vec::new()
            }
        }
    }
}

/// Request and schedule of the running session, kept for failover
#[derive(Debug, Clone)]
struct PnoSession {
    request: PnoRequest,
    schedule: ScheduleResult,
}

/// Owns background-scan backend selection for one interface
pub struct PnoController {
    interface: InterfaceInfo,
    offload: OffloadBackend,
    netlink: NetlinkBackend,
    caps: CapabilityModel,
    policy: SchedulePolicy,
    active: PnoBackendKind,
    session: Option<PnoSession>,
    buffered: Vec<ScanResult>,
    health: HealthRegistry,
    metrics: ScanMetrics,
    logger: StructuredLogger,
}

impl PnoController {
    pub fn new(
        interface: InterfaceInfo,
        transport: Arc<dyn KernelScanTransport>,
        offload: Arc<dyn OffloadEngine>,
        caps: CapabilityModel,
        policy: SchedulePolicy,
        health: HealthRegistry,
    ) -> Self {
        let logger = StructuredLogger::new(&interface.name);
        let netlink = NetlinkBackend::new(transport, interface.index, caps);
        Self {
            interface,
            offload: OffloadBackend::new(offload),
            netlink,
            caps,
            policy,
            active: PnoBackendKind::None,
            session: None,
            buffered: Vec::new(),
            health,
            metrics: ScanMetrics::new(),
            logger,
        }
    }

    pub fn active_backend(&self) -> PnoBackendKind {
        self.active
    }

    /// Schedule of the running session, if any
    pub fn current_schedule(&self) -> Option<&ScheduleResult> {
        self.session.as_ref().map(|s| &s.schedule)
    }

    /// Start background scanning, preferring the offload engine
    pub async fn start(&mut self, request: PnoRequest) -> bool {
        if !request.is_valid() {
            warn!(interface = %self.interface.name, "Rejecting PNO request with zero interval");
            return false;
        }

        if self.active != PnoBackendKind::None {
            info!(
                interface = %self.interface.name,
                backend = self.active.as_str(),
                "PNO already running, restarting with new request"
            );
            self.stop().await;
        }

        let schedule = self.policy.build(request.interval_ms, self.caps.scan());
        self.buffered.clear();

        let mut candidates: Vec<&dyn PnoBackend> = Vec::with_capacity(2);
        if self.offload.is_supported() {
            candidates.push(&self.offload);
        }
        candidates.push(&self.netlink);

        let mut started = PnoBackendKind::None;
        for backend in candidates {
            if backend.start(&request, &schedule).await {
                started = backend.kind();
                break;
            }
            if backend.kind() == PnoBackendKind::Offload {
                warn!(
                    interface = %self.interface.name,
                    "Offload start failed, falling back to kernel scheduled scan"
                );
            }
        }
        if started == PnoBackendKind::Offload {
            self.health
                .set_healthy(&self.component(components::OFFLOAD))
                .await;
        }

        if started == PnoBackendKind::None {
            self.set_active(PnoBackendKind::None);
            return false;
        }

        self.logger
            .log_pno_started(started, request.interval_ms, schedule.plans.len());
        self.metrics.inc_pno_starts(&self.interface.name, started);
        self.health.set_healthy(&self.component(components::PNO)).await;
        self.session = Some(PnoSession { request, schedule });
        self.set_active(started);
        true
    }

    /// Stop background scanning on every backend that might be running
    pub async fn stop(&mut self) -> bool {
        let previous = self.active;

        // Kernel stop is issued whatever the tracked backend is.
        let kernel_stopped = self.netlink.stop().await;
        let ok = match self.backend(previous) {
            Some(backend) if backend.kind() == PnoBackendKind::Netlink => kernel_stopped,
            Some(backend) => backend.stop().await,
            None => true,
        };

        if previous != PnoBackendKind::None {
            self.logger.log_pno_stopped(previous);
        }
        self.session = None;
        self.set_active(PnoBackendKind::None);
        ok
    }

    /// Offload engine failed asynchronously: move the session to the kernel
    pub async fn on_offload_error(&mut self, reason: OffloadFailure) {
        if self.active != PnoBackendKind::Offload {
            debug!(
                interface = %self.interface.name,
                reason = ?reason,
                "Offload error while offload inactive, ignoring"
            );
            return;
        }
        let Some(session) = self.session.clone() else {
            self.set_active(PnoBackendKind::None);
            return;
        };

        let reason_text = format!("{:?}", reason);
        self.metrics.inc_offload_failovers(&self.interface.name);
        self.health
            .set_degraded(
                &self.component(components::OFFLOAD),
                format!("offload failed: {}", reason_text),
            )
            .await;

        if self.netlink.start(&session.request, &session.schedule).await {
            self.logger.log_pno_failover(&reason_text, true);
            self.set_active(PnoBackendKind::Netlink);
        } else {
            self.logger.log_pno_failover(&reason_text, false);
            self.health
                .set_degraded(
                    &self.component(components::PNO),
                    "background scan lost after offload failure",
                )
                .await;
            self.session = None;
            self.set_active(PnoBackendKind::None);
        }
    }

    /// Offload engine has results: buffer them for the next query
    pub async fn on_offload_results(&mut self) {
        if self.active != PnoBackendKind::Offload {
            debug!(interface = %self.interface.name, "Stale offload results, ignoring");
            return;
        }
        self.buffer_results(PnoBackendKind::Offload).await;
    }

    /// Kernel scheduled scan produced results: buffer them for the next query
    pub async fn on_sched_scan_results(&mut self) {
        if self.active != PnoBackendKind::Netlink {
            debug!(
                interface = %self.interface.name,
                "Scheduled scan results while netlink inactive, ignoring"
            );
            return;
        }
        self.buffer_results(PnoBackendKind::Netlink).await;
    }

    /// Most recently buffered results of the current or last backend
    pub fn results(&self) -> Vec<ScanResult> {
        self.buffered.clone()
    }

    /// Backend object behind a kind, for callers that need the shared surface
    pub fn backend(&self, kind: PnoBackendKind) -> Option<&dyn PnoBackend> {
        match kind {
            PnoBackendKind::Offload => Some(&self.offload as &dyn PnoBackend),
            PnoBackendKind::Netlink => Some(&self.netlink as &dyn PnoBackend),
            PnoBackendKind::None => None,
        }
    }

    async fn buffer_results(&mut self, kind: PnoBackendKind) {
        let Some(backend) = self.backend(kind) else {
            return;
        };
        let results = backend.results().await;
        self.buffered = results;
        debug!(
            interface = %self.interface.name,
            backend = kind.as_str(),
            count = self.buffered.len(),
            "Buffered background scan results"
        );
    }

    fn set_active(&mut self, kind: PnoBackendKind) {
        self.active = kind;
        self.metrics.set_pno_backend(&self.interface.name, kind);
    }

    fn component(&self, component: &str) -> String {
        components::for_interface(&self.interface.name, component)
    }
}
