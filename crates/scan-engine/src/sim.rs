//! In-memory radio collaborators
//!
//! [`SimulatedRadio`] behaves like an nl80211 transport and
//! [`SimulatedOffload`] like a firmware offload engine. Both complete their
//! work on spawned tasks and report through the interface's event channel,
//! so the daemon can run end to end without hardware.

use crate::error::{OffloadError, TransportError, ENODEV};
use crate::events::{EventSender, KernelScanEvent, OffloadEvent, OffloadFailure, RadioEvent};
use crate::models::{NativeScanResult, OffloadScanResult, PnoRequest, ScanType};
use crate::schedule::ScheduleResult;
use crate::transport::{KernelScanTransport, OffloadEngine, SchedScanRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const ENOENT: i32 = 2;

/// Time a simulated one-shot scan takes to complete
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_millis(50);

/// Networks the simulated radio "sees"
pub fn default_networks() -> Vec<NativeScanResult> {
    vec![
        NativeScanResult {
            ssid: b"HomeNetwork".to_vec(),
            bssid: [0x02, 0x1a, 0x11, 0x00, 0x00, 0x01],
            frequency: 5180,
            signal_mbm: -4800,
            tsf: 1_200_000,
            capability: 0x0411,
            associated: true,
        },
        NativeScanResult {
            ssid: b"CoffeeShop".to_vec(),
            bssid: [0x02, 0x1a, 0x11, 0x00, 0x00, 0x02],
            frequency: 2437,
            signal_mbm: -7100,
            tsf: 1_200_150,
            capability: 0x0401,
            associated: false,
        },
        NativeScanResult {
            ssid: b"Office-6G".to_vec(),
            bssid: [0x02, 0x1a, 0x11, 0x00, 0x00, 0x03],
            frequency: 5975,
            signal_mbm: -6400,
            tsf: 1_200_300,
            capability: 0x0411,
            associated: false,
        },
    ]
}

fn to_offload(native: &NativeScanResult) -> OffloadScanResult {
    OffloadScanResult {
        ssid: native.ssid.clone(),
        bssid: native.bssid,
        frequency: native.frequency,
        rssi: (native.signal_mbm / 100).clamp(i8::MIN as i32, i8::MAX as i32) as i8,
        tsf: native.tsf,
        capability: native.capability,
    }
}

fn send(events: &EventSender, event: impl Into<RadioEvent>) {
    if events.send(event.into()).is_err() {
        debug!("Event channel closed, dropping simulated event");
    }
}

fn cancel(slot: &Mutex<Option<JoinHandle<()>>>) -> bool {
    match slot.lock() {
        Ok(mut guard) => match guard.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        },
        Err(_) => false,
    }
}

fn is_running(slot: &Mutex<Option<JoinHandle<()>>>) -> bool {
    slot.lock()
        .map(|guard| guard.as_ref().is_some_and(|h| !h.is_finished()))
        .unwrap_or(false)
}

fn store(slot: &Mutex<Option<JoinHandle<()>>>, handle: JoinHandle<()>) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(handle);
    }
}

/// Periodic emitter following a plan list, then the final interval forever
fn spawn_schedule<F>(schedule: ScheduleResult, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        for plan in &schedule.plans {
            for _ in 0..plan.iterations {
                tokio::time::sleep(Duration::from_millis(plan.interval_ms as u64)).await;
                tick();
            }
        }
        let period = Duration::from_millis(schedule.final_interval_ms.max(1) as u64);
        loop {
            tokio::time::sleep(period).await;
            tick();
        }
    })
}

/// Kernel scan transport backed by a fixed set of networks
pub struct SimulatedRadio {
    events: EventSender,
    networks: Arc<Mutex<Vec<NativeScanResult>>>,
    scan_duration: Duration,
    present: AtomicBool,
    scan_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    sched_task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedRadio {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            networks: Arc::new(Mutex::new(default_networks())),
            scan_duration: DEFAULT_SCAN_DURATION,
            present: AtomicBool::new(true),
            scan_task: Arc::new(Mutex::new(None)),
            sched_task: Mutex::new(None),
        }
    }

    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }

    pub fn with_networks(self, networks: Vec<NativeScanResult>) -> Self {
        if let Ok(mut guard) = self.networks.lock() {
            *guard = networks;
        }
        self
    }

    /// Make every later command fail as if the device was hot-unplugged
    pub fn remove_device(&self) {
        self.present.store(false, Ordering::SeqCst);
        cancel(&self.scan_task);
        cancel(&self.sched_task);
    }

    pub fn is_scheduled_scan_running(&self) -> bool {
        is_running(&self.sched_task)
    }

    fn check_present(&self) -> Result<(), TransportError> {
        if self.present.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::from_errno(ENODEV))
        }
    }
}

#[async_trait]
impl KernelScanTransport for SimulatedRadio {
    async fn scan(
        &self,
        iface_index: u32,
        randomize_mac: bool,
        scan_type: ScanType,
        ssids: &[String],
        frequencies: &[u32],
    ) -> Result<(), TransportError> {
        self.check_present()?;
        if is_running(&self.scan_task) {
            return Err(TransportError::Busy);
        }

        debug!(
            iface_index,
            randomize_mac,
            scan_type = scan_type.as_str(),
            ssids = ssids.len(),
            frequencies = frequencies.len(),
            "Simulated scan triggered"
        );

        let events = self.events.clone();
        let duration = self.scan_duration;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            send(&events, KernelScanEvent::ScanResultsReady);
        });
        store(&self.scan_task, handle);
        Ok(())
    }

    async fn abort_scan(&self, _iface_index: u32) -> Result<(), TransportError> {
        self.check_present()?;
        if cancel(&self.scan_task) {
            send(&self.events, KernelScanEvent::ScanAborted);
            Ok(())
        } else {
            Err(TransportError::Errno(ENOENT))
        }
    }

    async fn get_scan_results(
        &self,
        _iface_index: u32,
    ) -> Result<Vec<NativeScanResult>, TransportError> {
        self.check_present()?;
        self.networks
            .lock()
            .map(|n| n.clone())
            .map_err(|_| TransportError::Other("network table poisoned".to_string()))
    }

    async fn start_scheduled_scan(
        &self,
        iface_index: u32,
        request: &SchedScanRequest,
    ) -> Result<(), TransportError> {
        self.check_present()?;
        if is_running(&self.sched_task) {
            return Err(TransportError::Busy);
        }

        debug!(
            iface_index,
            plans = request.schedule.plans.len(),
            final_interval_ms = request.schedule.final_interval_ms,
            match_ssids = request.match_ssids.len(),
            "Simulated scheduled scan started"
        );

        let events = self.events.clone();
        let handle = spawn_schedule(request.schedule.clone(), move || {
            send(&events, KernelScanEvent::SchedScanResultsReady);
        });
        store(&self.sched_task, handle);
        Ok(())
    }

    async fn stop_scheduled_scan(&self, _iface_index: u32) -> Result<(), TransportError> {
        self.check_present()?;
        if cancel(&self.sched_task) {
            Ok(())
        } else {
            Err(TransportError::Errno(ENOENT))
        }
    }
}

/// Firmware offload engine with switchable availability and injectable faults
pub struct SimulatedOffload {
    events: EventSender,
    networks: Vec<NativeScanResult>,
    supported: AtomicBool,
    reject_starts: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedOffload {
    pub fn new(events: EventSender, supported: bool) -> Self {
        Self {
            events,
            networks: default_networks(),
            supported: AtomicBool::new(supported),
            reject_starts: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Refuse subsequent start requests synchronously
    pub fn set_reject_starts(&self, reject: bool) {
        self.reject_starts.store(reject, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        is_running(&self.task)
    }

    /// Kill the running offload scan and report the failure asynchronously
    pub fn inject_error(&self, reason: OffloadFailure) {
        warn!(reason = ?reason, "Injecting simulated offload failure");
        cancel(&self.task);
        send(&self.events, OffloadEvent::Error(reason));
    }
}

#[async_trait]
impl OffloadEngine for SimulatedOffload {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    async fn start_scan(
        &self,
        request: &PnoRequest,
        schedule: &ScheduleResult,
    ) -> Result<(), OffloadError> {
        if !self.is_supported() {
            return Err(OffloadError::NotAvailable);
        }
        if self.reject_starts.load(Ordering::SeqCst) {
            return Err(OffloadError::Rejected("firmware busy".to_string()));
        }

        cancel(&self.task);
        debug!(
            interval_ms = request.interval_ms,
            plans = schedule.plans.len(),
            "Simulated offload scan started"
        );

        let events = self.events.clone();
        let handle = spawn_schedule(schedule.clone(), move || {
            send(&events, OffloadEvent::ScanResultsAvailable);
        });
        store(&self.task, handle);
        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), OffloadError> {
        cancel(&self.task);
        Ok(())
    }

    async fn get_scan_results(&self) -> Result<Vec<OffloadScanResult>, OffloadError> {
        Ok(self.networks.iter().map(to_offload).collect())
    }
}
