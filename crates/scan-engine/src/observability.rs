//! Observability infrastructure for the scan engine
//!
//! Provides:
//! - Prometheus metrics (scan dispatch, PNO backends, failovers, fatal errors)
//! - Structured event logging with tracing

use crate::models::{PnoBackendKind, ScanType};
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge_vec, Histogram,
    IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for kernel dispatch latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ScanMetricsInner> = OnceLock::new();

struct ScanMetricsInner {
    scan_dispatch_latency_seconds: Histogram,
    scans_requested: IntCounterVec,
    scan_failures: IntCounterVec,
    pno_starts: IntCounterVec,
    offload_failovers: IntCounterVec,
    fatal_errors: IntCounterVec,
    pno_backend: IntGaugeVec,
}

impl ScanMetricsInner {
    fn new() -> Self {
        Self {
            scan_dispatch_latency_seconds: register_histogram!(
                "scan_engine_scan_dispatch_latency_seconds",
                "Time spent dispatching one-shot scans to the kernel",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register scan_dispatch_latency_seconds"),

            scans_requested: register_int_counter_vec!(
                "scan_engine_scans_requested_total",
                "One-shot scans dispatched, by effective scan type",
                &["interface", "scan_type"]
            )
            .expect("Failed to register scans_requested"),

            scan_failures: register_int_counter_vec!(
                "scan_engine_scan_failures_total",
                "One-shot scans rejected by the kernel",
                &["interface"]
            )
            .expect("Failed to register scan_failures"),

            pno_starts: register_int_counter_vec!(
                "scan_engine_pno_starts_total",
                "Background scans started, by backend",
                &["interface", "backend"]
            )
            .expect("Failed to register pno_starts"),

            offload_failovers: register_int_counter_vec!(
                "scan_engine_offload_failovers_total",
                "Switches from the offload backend to kernel scheduled scans",
                &["interface"]
            )
            .expect("Failed to register offload_failovers"),

            fatal_errors: register_int_counter_vec!(
                "scan_engine_fatal_errors_total",
                "Unrecoverable device errors",
                &["interface"]
            )
            .expect("Failed to register fatal_errors"),

            pno_backend: register_int_gauge_vec!(
                "scan_engine_pno_backend",
                "Active PNO backend (0 none, 1 offload, 2 netlink)",
                &["interface"]
            )
            .expect("Failed to register pno_backend"),
        }
    }
}

/// Scan engine metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct ScanMetrics {
    _private: (),
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ScanMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ScanMetricsInner {
        GLOBAL_METRICS.get_or_init(ScanMetricsInner::new)
    }

    pub fn observe_scan_dispatch_latency(&self, duration_secs: f64) {
        self.inner().scan_dispatch_latency_seconds.observe(duration_secs);
    }

    pub fn inc_scans_requested(&self, interface: &str, scan_type: ScanType) {
        self.inner()
            .scans_requested
            .with_label_values(&[interface, scan_type.as_str()])
            .inc();
    }

    pub fn inc_scan_failures(&self, interface: &str) {
        self.inner()
            .scan_failures
            .with_label_values(&[interface])
            .inc();
    }

    pub fn inc_pno_starts(&self, interface: &str, backend: PnoBackendKind) {
        self.inner()
            .pno_starts
            .with_label_values(&[interface, backend.as_str()])
            .inc();
    }

    pub fn inc_offload_failovers(&self, interface: &str) {
        self.inner()
            .offload_failovers
            .with_label_values(&[interface])
            .inc();
    }

    pub fn inc_fatal_errors(&self, interface: &str) {
        self.inner()
            .fatal_errors
            .with_label_values(&[interface])
            .inc();
    }

    pub fn set_pno_backend(&self, interface: &str, backend: PnoBackendKind) {
        let value = match backend {
            PnoBackendKind::None => 0,
            PnoBackendKind::Offload => 1,
            PnoBackendKind::Netlink => 2,
        };
        self.inner()
            .pno_backend
            .with_label_values(&[interface])
            .set(value);
    }
}

/// Structured logger for scan engine events
///
/// Provides consistent event-style records for scans, PNO sessions and
/// backend switches of one interface.
#[derive(Clone)]
pub struct StructuredLogger {
    interface: String,
}

impl StructuredLogger {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    /// Log a dispatched one-shot scan
    pub fn log_scan_dispatched(
        &self,
        requested: ScanType,
        effective: ScanType,
        ssid_count: usize,
        frequency_count: usize,
        randomize_mac: bool,
    ) {
        info!(
            event = "scan_dispatched",
            interface = %self.interface,
            requested_scan_type = requested.as_str(),
            scan_type = effective.as_str(),
            ssids = ssid_count,
            frequencies = frequency_count,
            randomize_mac = randomize_mac,
            "One-shot scan dispatched"
        );
    }

    /// Log a one-shot scan the kernel refused
    pub fn log_scan_failed(&self, error: &str, errno: Option<i32>) {
        warn!(
            event = "scan_failed",
            interface = %self.interface,
            error = %error,
            errno = ?errno,
            "One-shot scan request failed"
        );
    }

    /// Log a PNO session start
    pub fn log_pno_started(&self, backend: PnoBackendKind, interval_ms: u32, plans: usize) {
        info!(
            event = "pno_started",
            interface = %self.interface,
            backend = backend.as_str(),
            interval_ms = interval_ms,
            scan_plans = plans,
            "Background scan started"
        );
    }

    /// Log a PNO session stop
    pub fn log_pno_stopped(&self, backend: PnoBackendKind) {
        info!(
            event = "pno_stopped",
            interface = %self.interface,
            backend = backend.as_str(),
            "Background scan stopped"
        );
    }

    /// Log a switch from offload to kernel scheduled scans
    pub fn log_pno_failover(&self, reason: &str, success: bool) {
        if success {
            warn!(
                event = "pno_failover",
                interface = %self.interface,
                reason = %reason,
                "Offload backend failed, background scan moved to kernel scheduled scan"
            );
        } else {
            error!(
                event = "pno_failover_failed",
                interface = %self.interface,
                reason = %reason,
                "Offload backend failed and kernel scheduled scan could not be started"
            );
        }
    }

    /// Log loss of the underlying device
    pub fn log_fatal(&self, index: u32) {
        error!(
            event = "fatal_device_lost",
            interface = %self.interface,
            interface_index = index,
            "Device disappeared, scanning disabled until the interface is recreated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_metrics_creation() {
        let metrics = ScanMetrics::new();

        metrics.observe_scan_dispatch_latency(0.001);
        metrics.inc_scans_requested("wlan0", ScanType::LowPower);
        metrics.inc_scan_failures("wlan0");
        metrics.inc_pno_starts("wlan0", PnoBackendKind::Offload);
        metrics.inc_offload_failovers("wlan0");
        metrics.set_pno_backend("wlan0", PnoBackendKind::Netlink);
    }

    #[test]
    fn test_metric_handles_share_state() {
        let a = ScanMetrics::new();
        let b = a.clone();
        a.inc_fatal_errors("metrics-test0");
        b.inc_fatal_errors("metrics-test0");

        let count = GLOBAL_METRICS
            .get()
            .unwrap()
            .fatal_errors
            .with_label_values(&["metrics-test0"])
            .get();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("wlan0");
        assert_eq!(logger.interface, "wlan0");
    }
}
