//! Asynchronous notifications delivered by the radio collaborators
//!
//! Both the kernel transport and the offload engine publish onto one
//! channel per interface so that callback-driven state changes are applied
//! by the engine under the same lock as caller-driven ones.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Completion notifications from the kernel scan transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelScanEvent {
    /// A one-shot scan finished and results can be fetched
    ScanResultsReady,
    /// A one-shot scan was aborted by the kernel or by an abort request
    ScanAborted,
    /// A scheduled scan cycle produced results
    SchedScanResultsReady,
    /// The kernel stopped the scheduled scan on its own
    SchedScanStopped,
}

/// Why the offload engine gave up asynchronously
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffloadFailure {
    /// The offload service process died
    ServiceDied,
    /// The firmware reported a scan failure
    RemoteFailure,
}

/// Notifications from the offload engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadEvent {
    ScanResultsAvailable,
    Error(OffloadFailure),
}

/// Any event addressed to one interface's engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioEvent {
    Kernel(KernelScanEvent),
    Offload(OffloadEvent),
}

impl From<KernelScanEvent> for RadioEvent {
    fn from(event: KernelScanEvent) -> Self {
        RadioEvent::Kernel(event)
    }
}

impl From<OffloadEvent> for RadioEvent {
    fn from(event: OffloadEvent) -> Self {
        RadioEvent::Offload(event)
    }
}

pub type EventSender = mpsc::UnboundedSender<RadioEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<RadioEvent>;

/// Create the event channel for one interface
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
