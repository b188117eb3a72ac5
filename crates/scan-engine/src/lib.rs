//! Wi-Fi scan scheduling library
//!
//! This crate provides the core functionality for:
//! - One-shot scan dispatch with capability-aware downgrades
//! - Scan plan generation for background (PNO) scans
//! - Offload-first PNO with automatic fallback to kernel scheduled scans
//! - Per-interface engines driven by collaborator events
//! - Health checks and observability

pub mod capabilities;
pub mod engine;
pub mod error;
pub mod events;
pub mod health;
pub mod models;
pub mod observability;
pub mod pno;
pub mod registry;
pub mod scanner;
pub mod schedule;
pub mod sim;
pub mod transport;

#[cfg(test)]
mod mock;

pub use capabilities::{CapabilityModel, ScanCapabilities, WiphyFeatures};
pub use engine::{ScanEngine, ScanEngineBuilder};
pub use error::{EngineError, FatalError, OffloadError, TransportError};
pub use events::{event_channel, EventReceiver, EventSender, RadioEvent};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ScanMetrics, StructuredLogger};
pub use registry::EngineRegistry;
pub use schedule::{build_schedule, SchedulePolicy, ScheduleResult};
pub use transport::{KernelScanTransport, NoOffload, OffloadEngine};
