//! Interfaces of the external radio collaborators
//!
//! The kernel transport issues nl80211 scan commands; the offload engine
//! drives chip-resident periodic scanning. Neither is implemented here
//! beyond the in-memory simulation in [`crate::sim`].

use crate::error::{OffloadError, TransportError};
use crate::models::{NativeScanResult, OffloadScanResult, PnoRequest, RssiThresholds, ScanType};
use crate::schedule::ScheduleResult;
use async_trait::async_trait;

/// Parameters of a kernel scheduled scan, already fitted to capability limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedScanRequest {
    pub schedule: ScheduleResult,
    pub scan_ssids: Vec<String>,
    pub match_ssids: Vec<String>,
    pub frequencies: Vec<u32>,
    pub rssi_thresholds: RssiThresholds,
    pub randomize_mac: bool,
}

/// Kernel (nl80211) scan command transport
#[async_trait]
pub trait KernelScanTransport: Send + Sync {
    /// Trigger a one-shot scan; completion is reported through the event channel
    async fn scan(
        &self,
        iface_index: u32,
        randomize_mac: bool,
        scan_type: ScanType,
        ssids: &[String],
        frequencies: &[u32],
    ) -> Result<(), TransportError>;

    /// Abort the one-shot scan in progress
    async fn abort_scan(&self, iface_index: u32) -> Result<(), TransportError>;

    /// Fetch the kernel's cached scan results
    async fn get_scan_results(&self, iface_index: u32)
        -> Result<Vec<NativeScanResult>, TransportError>;

    /// Start kernel-driven periodic scanning
    async fn start_scheduled_scan(
        &self,
        iface_index: u32,
        request: &SchedScanRequest,
    ) -> Result<(), TransportError>;

    /// Stop kernel-driven periodic scanning; fails if none is running
    async fn stop_scheduled_scan(&self, iface_index: u32) -> Result<(), TransportError>;
}

/// Hardware/firmware periodic scanner
#[async_trait]
pub trait OffloadEngine: Send + Sync {
    /// Whether offload hardware is present right now
    fn is_supported(&self) -> bool;

    async fn start_scan(
        &self,
        request: &PnoRequest,
        schedule: &ScheduleResult,
    ) -> Result<(), OffloadError>;

    async fn stop_scan(&self) -> Result<(), OffloadError>;

    async fn get_scan_results(&self) -> Result<Vec<OffloadScanResult>, OffloadError>;
}

/// Offload engine for radios without offload hardware
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOffload;

#[async_trait]
impl OffloadEngine for NoOffload {
    fn is_supported(&self) -> bool {
        false
    }

    async fn start_scan(
        &self,
        _request: &PnoRequest,
        _schedule: &ScheduleResult,
    ) -> Result<(), OffloadError> {
        Err(OffloadError::NotAvailable)
    }

    async fn stop_scan(&self) -> Result<(), OffloadError> {
        Err(OffloadError::NotAvailable)
    }

    async fn get_scan_results(&self) -> Result<Vec<OffloadScanResult>, OffloadError> {
        Ok(Vec::new())
    }
}
