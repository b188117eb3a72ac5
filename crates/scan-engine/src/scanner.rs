//! One-shot scan scheduling
//!
//! Tracks whether a kernel scan is outstanding so that aborts only reach the
//! transport when there is something to abort, resolves requested scan
//! sub-types against driver features, and escalates device loss.

use crate::capabilities::{fit_to_limit, CapabilityModel};
use crate::error::FatalError;
use crate::events::KernelScanEvent;
use crate::health::{components, HealthRegistry};
use crate::models::{InterfaceInfo, ScanResult, ScanType, SingleScanRequest};
use crate::observability::{ScanMetrics, StructuredLogger};
use crate::transport::KernelScanTransport;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Receives conditions that make an interface unusable
pub trait FatalErrorHandler: Send + Sync {
    fn on_fatal(&self, error: &FatalError);
}

/// Default handler: the daemon must not keep running against a vanished device
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnFatal;

impl FatalErrorHandler for AbortOnFatal {
    fn on_fatal(&self, error: &FatalError) {
        error!(error = %error, "Unrecoverable driver state, aborting");
        std::process::abort();
    }
}

/// Single-scan state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleScanState {
    Idle,
    ScanPending,
}

/// Use the requested scan type if the driver supports it, otherwise DEFAULT
pub fn resolve_scan_type(requested: ScanType, caps: &CapabilityModel) -> ScanType {
    if caps.supports_scan_type(requested) {
        requested
    } else {
        ScanType::Default
    }
}

/// Dispatches one-shot scans for one interface
pub struct ScanScheduler {
    interface: InterfaceInfo,
    transport: Arc<dyn KernelScanTransport>,
    caps: CapabilityModel,
    state: SingleScanState,
    defunct: bool,
    fatal_handler: Arc<dyn FatalErrorHandler>,
    health: HealthRegistry,
    metrics: ScanMetrics,
    logger: StructuredLogger,
}

impl ScanScheduler {
    pub fn new(
        interface: InterfaceInfo,
        transport: Arc<dyn KernelScanTransport>,
        caps: CapabilityModel,
        fatal_handler: Arc<dyn FatalErrorHandler>,
        health: HealthRegistry,
    ) -> Self {
        let logger = StructuredLogger::new(&interface.name);
        Self {
            interface,
            transport,
            caps,
            state: SingleScanState::Idle,
            defunct: false,
            fatal_handler,
            health,
            metrics: ScanMetrics::new(),
            logger,
        }
    }

    pub fn state(&self) -> SingleScanState {
        self.state
    }

    pub fn is_scan_pending(&self) -> bool {
        self.state == SingleScanState::ScanPending
    }

    /// Whether the device vanished and the interface must be recreated
    pub fn is_defunct(&self) -> bool {
        self.defunct
    }

    /// Dispatch a one-shot scan; `true` if the kernel accepted it
    pub async fn scan(&mut self, request: &SingleScanRequest) -> bool {
        if self.defunct {
            warn!(interface = %self.interface.name, "Scan requested on defunct interface");
            return false;
        }

        let scan_type = resolve_scan_type(request.scan_type, &self.caps);
        if scan_type != request.scan_type {
            debug!(
                interface = %self.interface.name,
                requested = request.scan_type.as_str(),
                "Scan type unsupported by driver, using default"
            );
        }
        let randomize_mac = request.randomize_mac && self.caps.supports_random_mac_oneshot_scan();
        let ssids = fit_to_limit(&request.ssids, self.caps.max_scan_ssids(), "scan_ssids");

        if self.state == SingleScanState::ScanPending {
            debug!(interface = %self.interface.name, "Scan dispatched while another is pending");
        }

        let start = Instant::now();
        let outcome = self
            .transport
            .scan(
                self.interface.index,
                randomize_mac,
                scan_type,
                ssids,
                &request.frequencies,
            )
            .await;
        self.metrics
            .observe_scan_dispatch_latency(start.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => {
                self.state = SingleScanState::ScanPending;
                self.metrics
                    .inc_scans_requested(&self.interface.name, scan_type);
                self.logger.log_scan_dispatched(
                    request.scan_type,
                    scan_type,
                    ssids.len(),
                    request.frequencies.len(),
                    randomize_mac,
                );
                true
            }
            // A rejected dispatch leaves any earlier pending scan outstanding.
            Err(e) => {
                if e.is_fatal() {
                    self.enter_fatal().await;
                } else {
                    self.metrics.inc_scan_failures(&self.interface.name);
                    self.logger.log_scan_failed(&e.to_string(), e.errno());
                }
                false
            }
        }
    }

    /// Abort the outstanding scan, if any. Always succeeds.
    pub async fn abort(&mut self) -> bool {
        if self.state == SingleScanState::Idle {
            debug!(interface = %self.interface.name, "No scan in progress, nothing to abort");
            return true;
        }

        if let Err(e) = self.transport.abort_scan(self.interface.index).await {
            warn!(interface = %self.interface.name, error = %e, "Abort scan failed");
        }
        true
    }

    /// Latest kernel scan results
    pub async fn scan_results(&self) -> Vec<ScanResult> {
        if self.defunct {
            return Vec::new();
        }

        match self.transport.get_scan_results(self.interface.index).await {
            Ok(raw) => raw.iter().map(ScanResult::from).collect(),
            Err(e) => {
                warn!(interface = %self.interface.name, error = %e, "Failed to fetch scan results");
                Vec::new()
            }
        }
    }

    /// Apply a kernel completion notification
    pub fn on_kernel_event(&mut self, event: KernelScanEvent) {
        match event {
            KernelScanEvent::ScanResultsReady | KernelScanEvent::ScanAborted => {
                if self.state == SingleScanState::ScanPending {
                    debug!(interface = %self.interface.name, event = ?event, "One-shot scan finished");
                }
                self.state = SingleScanState::Idle;
            }
            KernelScanEvent::SchedScanResultsReady | KernelScanEvent::SchedScanStopped => {}
        }
    }

    async fn enter_fatal(&mut self) {
        self.defunct = true;
        self.metrics.inc_fatal_errors(&self.interface.name);
        self.logger.log_fatal(self.interface.index);
        self.health
            .set_unhealthy(
                &components::for_interface(&self.interface.name, components::SCANNER),
                "device removed",
            )
            .await;

        let error = FatalError::DeviceGone {
            interface: self.interface.name.clone(),
            index: self.interface.index,
        };
        self.fatal_handler.on_fatal(&error);
    }
}
