//! Recording collaborators for unit tests

use crate::error::{FatalError, OffloadError, TransportError};
use crate::models::{NativeScanResult, OffloadScanResult, PnoRequest, ScanType};
use crate::scanner::FatalErrorHandler;
use crate::schedule::ScheduleResult;
use crate::transport::{KernelScanTransport, OffloadEngine, SchedScanRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// One-shot scan parameters as seen by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScan {
    pub iface_index: u32,
    pub randomize_mac: bool,
    pub scan_type: ScanType,
    pub ssids: Vec<String>,
    pub frequencies: Vec<u32>,
}

/// Kernel transport that records every call and answers from scripted results
pub struct MockTransport {
    pub scans: Mutex<Vec<RecordedScan>>,
    pub scan_error: Mutex<Option<TransportError>>,
    pub abort_calls: AtomicUsize,
    pub sched_starts: Mutex<Vec<SchedScanRequest>>,
    pub sched_start_ok: AtomicBool,
    pub sched_stop_calls: AtomicUsize,
    pub sched_running: AtomicBool,
    pub results: Mutex<Vec<NativeScanResult>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            scans: Mutex::new(Vec::new()),
            scan_error: Mutex::new(None),
            abort_calls: AtomicUsize::new(0),
            sched_starts: Mutex::new(Vec::new()),
            sched_start_ok: AtomicBool::new(true),
            sched_stop_calls: AtomicUsize::new(0),
            sched_running: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_scans_with(&self, error: TransportError) {
        *self.scan_error.lock().unwrap() = Some(error);
    }

    pub fn fail_sched_starts(&self) {
        self.sched_start_ok.store(false, Ordering::SeqCst);
    }

    pub fn set_results(&self, results: Vec<NativeScanResult>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn last_scan(&self) -> Option<RecordedScan> {
        self.scans.lock().unwrap().last().cloned()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().unwrap().len()
    }

    pub fn sched_start_count(&self) -> usize {
        self.sched_starts.lock().unwrap().len()
    }

    pub fn last_sched_start(&self) -> Option<SchedScanRequest> {
        self.sched_starts.lock().unwrap().last().cloned()
    }

    pub fn is_sched_running(&self) -> bool {
        self.sched_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KernelScanTransport for MockTransport {
    async fn scan(
        &self,
        iface_index: u32,
        randomize_mac: bool,
        scan_type: ScanType,
        ssids: &[String],
        frequencies: &[u32],
    ) -> Result<(), TransportError> {
        self.scans.lock().unwrap().push(RecordedScan {
            iface_index,
            randomize_mac,
            scan_type,
            ssids: ssids.to_vec(),
            frequencies: frequencies.to_vec(),
        });
        match self.scan_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn abort_scan(&self, _iface_index: u32) -> Result<(), TransportError> {
        self.abort_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_scan_results(
        &self,
        _iface_index: u32,
    ) -> Result<Vec<NativeScanResult>, TransportError> {
        Ok(self.results.lock().unwrap().clone())
    }

    async fn start_scheduled_scan(
        &self,
        _iface_index: u32,
        request: &SchedScanRequest,
    ) -> Result<(), TransportError> {
        self.sched_starts.lock().unwrap().push(request.clone());
        if self.sched_start_ok.load(Ordering::SeqCst) {
            self.sched_running.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(TransportError::Busy)
        }
    }

    async fn stop_scheduled_scan(&self, _iface_index: u32) -> Result<(), TransportError> {
        self.sched_stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.sched_running.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Errno(2))
        }
    }
}

/// Offload engine with switchable support and scripted start outcome
pub struct MockOffload {
    pub supported: AtomicBool,
    pub start_ok: AtomicBool,
    pub supported_queries: AtomicUsize,
    pub start_calls: Mutex<Vec<(PnoRequest, ScheduleResult)>>,
    pub stop_calls: AtomicUsize,
    pub running: AtomicBool,
    pub results: Mutex<Vec<OffloadScanResult>>,
}

impl MockOffload {
    pub fn new(supported: bool) -> Self {
        Self {
            supported: AtomicBool::new(supported),
            start_ok: AtomicBool::new(true),
            supported_queries: AtomicUsize::new(0),
            start_calls: Mutex::new(Vec::new()),
            stop_calls: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_starts(&self) {
        self.start_ok.store(false, Ordering::SeqCst);
    }

    pub fn set_results(&self, results: Vec<OffloadScanResult>) {
        *self.results.lock().unwrap() = results;
    }

    pub fn start_count(&self) -> usize {
        self.start_calls.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Simulate the firmware dying on its own
    pub fn crash(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl OffloadEngine for MockOffload {
    fn is_supported(&self) -> bool {
        self.supported_queries.fetch_add(1, Ordering::SeqCst);
        self.supported.load(Ordering::SeqCst)
    }

    async fn start_scan(
        &self,
        request: &PnoRequest,
        schedule: &ScheduleResult,
    ) -> Result<(), OffloadError> {
        self.start_calls
            .lock()
            .unwrap()
            .push((request.clone(), schedule.clone()));
        if self.start_ok.load(Ordering::SeqCst) {
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(OffloadError::Rejected("mock refused".to_string()))
        }
    }

    async fn stop_scan(&self) -> Result<(), OffloadError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn get_scan_results(&self) -> Result<Vec<OffloadScanResult>, OffloadError> {
        Ok(self.results.lock().unwrap().clone())
    }
}

/// Fatal handler that records instead of aborting the test process
#[derive(Default)]
pub struct RecordingFatalHandler {
    pub errors: Mutex<Vec<FatalError>>,
}

impl RecordingFatalHandler {
    pub fn count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl FatalErrorHandler for RecordingFatalHandler {
    fn on_fatal(&self, error: &FatalError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

pub fn native_result(ssid: &str, last_octet: u8, frequency: u32) -> NativeScanResult {
    NativeScanResult {
        ssid: ssid.as_bytes().to_vec(),
        bssid: [0x02, 0x00, 0x00, 0x00, 0x00, last_octet],
        frequency,
        signal_mbm: -6000,
        tsf: 42,
        capability: 0x0401,
        associated: false,
    }
}

pub fn offload_result(ssid: &str, last_octet: u8, frequency: u32) -> OffloadScanResult {
    OffloadScanResult {
        ssid: ssid.as_bytes().to_vec(),
        bssid: [0x02, 0x00, 0x00, 0x00, 0x00, last_octet],
        frequency,
        rssi: -60,
        tsf: 42,
        capability: 0x0401,
    }
}
