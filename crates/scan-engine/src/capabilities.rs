//! Radio and driver capability snapshot
//!
//! Queried once from the driver when an engine is built and never mutated
//! afterwards. A zero count means the corresponding feature is unsupported.

use crate::models::ScanType;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Scan-related limits reported by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanCapabilities {
    pub max_scan_ssids: u32,
    pub max_sched_scan_ssids: u32,
    pub max_match_sets: u32,
    pub max_scan_plans: u32,
    pub max_scan_plan_interval_sec: u32,
    pub max_scan_plan_iterations: u32,
}

/// Optional driver features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiphyFeatures {
    pub supports_low_span_scan: bool,
    pub supports_low_power_scan: bool,
    pub supports_high_accuracy_scan: bool,
    pub supports_random_mac_oneshot_scan: bool,
    pub supports_random_mac_sched_scan: bool,
}

/// Immutable description of what the radio can do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityModel {
    scan: ScanCapabilities,
    features: WiphyFeatures,
}

impl CapabilityModel {
    pub fn new(scan: ScanCapabilities, features: WiphyFeatures) -> Self {
        Self { scan, features }
    }

    pub fn scan(&self) -> &ScanCapabilities {
        &self.scan
    }

    pub fn features(&self) -> &WiphyFeatures {
        &self.features
    }

    pub fn max_scan_ssids(&self) -> u32 {
        self.scan.max_scan_ssids
    }

    pub fn max_sched_scan_ssids(&self) -> u32 {
        self.scan.max_sched_scan_ssids
    }

    pub fn max_match_sets(&self) -> u32 {
        self.scan.max_match_sets
    }

    /// Whether the driver accepts the given scan sub-type
    pub fn supports_scan_type(&self, scan_type: ScanType) -> bool {
        match scan_type {
            ScanType::Default => true,
            ScanType::LowSpan => self.features.supports_low_span_scan,
            ScanType::LowPower => self.features.supports_low_power_scan,
            ScanType::HighAccuracy => self.features.supports_high_accuracy_scan,
        }
    }

    pub fn supports_random_mac_oneshot_scan(&self) -> bool {
        self.features.supports_random_mac_oneshot_scan
    }

    pub fn supports_random_mac_sched_scan(&self) -> bool {
        self.features.supports_random_mac_sched_scan
    }
}

/// Trim a request list to a driver limit, warning about what gets dropped
pub(crate) fn fit_to_limit<'a, T>(items: &'a [T], limit: u32, what: &str) -> &'a [T] {
    let limit = limit as usize;
    if items.len() > limit {
        warn!(
            requested = items.len(),
            limit = limit,
            kind = what,
            "Request exceeds driver limit, truncating"
        );
        &items[..limit]
    } else {
        items
    }
}
