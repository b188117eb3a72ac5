//! Scan plan generation
//!
//! Turns a caller's requested PNO interval into a schedule the radio can
//! execute: an optional fast phase of bounded iterations followed by a slow
//! phase that runs forever. The run-forever phase is carried out-of-band as
//! `final_interval_ms` rather than as a zero-iteration plan.

use crate::capabilities::ScanCapabilities;
use serde::{Deserialize, Serialize};

/// Ratio between the slow steady-state cadence and the fast initial cadence
pub const SLOW_SCAN_INTERVAL_MULTIPLIER: u32 = 3;

/// Number of fast-phase scans before dropping to the slow cadence
pub const FAST_SCAN_ITERATIONS: u32 = 3;

/// One phase of a hardware schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPlan {
    pub interval_ms: u32,
    /// Number of scans in this phase; 0 would mean forever and is never emitted
    pub iterations: u32,
}

/// Output of the schedule builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub plans: Vec<ScanPlan>,
    /// Cadence once every finite plan is exhausted, or the only cadence
    pub final_interval_ms: u32,
}

impl ScheduleResult {
    /// Schedule that runs a single cadence forever
    pub fn single(interval_ms: u32) -> Self {
        Self {
            plans: Vec::new(),
            final_interval_ms: interval_ms,
        }
    }

    pub fn has_plans(&self) -> bool {
        !self.plans.is_empty()
    }
}

/// Tunables for schedule generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePolicy {
    pub slow_scan_interval_multiplier: u32,
    pub fast_scan_iterations: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            slow_scan_interval_multiplier: SLOW_SCAN_INTERVAL_MULTIPLIER,
            fast_scan_iterations: FAST_SCAN_ITERATIONS,
        }
    }
}

impl SchedulePolicy {
    /// Build a schedule for `interval_ms` under the given capabilities.
    ///
    /// Total: out-of-range inputs are clamped, never rejected.
    pub fn build(&self, interval_ms: u32, caps: &ScanCapabilities) -> ScheduleResult {
        if caps.max_scan_plans == 0 || caps.max_scan_plan_iterations == 0 {
            return ScheduleResult::single(interval_ms);
        }

        let ceiling_ms = if caps.max_scan_plan_interval_sec == 0 {
            u32::MAX
        } else {
            caps.max_scan_plan_interval_sec.saturating_mul(1000)
        };

        let multiplier = self.slow_scan_interval_multiplier.max(1);
        let final_interval_ms = interval_ms.saturating_mul(multiplier).min(ceiling_ms);

        let iterations = self
            .fast_scan_iterations
            .min(caps.max_scan_plan_iterations);
        if iterations == 0 {
            return ScheduleResult::single(final_interval_ms);
        }

        ScheduleResult {
            plans: vec![ScanPlan {
                interval_ms: interval_ms.min(ceiling_ms),
                iterations,
            }],
            final_interval_ms,
        }
    }
}

/// Build a schedule with the default policy
pub fn build_schedule(interval_ms: u32, caps: &ScanCapabilities) -> ScheduleResult {
    SchedulePolicy::default().build(interval_ms, caps)
}
