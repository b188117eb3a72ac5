//! Core data models for the scan engine

use serde::{Deserialize, Serialize};

/// Network interface an engine is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    /// Kernel interface index used in nl80211 commands
    pub index: u32,
}

impl InterfaceInfo {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Scan sub-type requested for a one-shot scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    #[default]
    Default,
    LowSpan,
    LowPower,
    HighAccuracy,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Default => "default",
            ScanType::LowSpan => "low_span",
            ScanType::LowPower => "low_power",
            ScanType::HighAccuracy => "high_accuracy",
        }
    }
}

/// Caller's one-shot scan intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleScanRequest {
    pub scan_type: ScanType,
    /// SSIDs to actively probe for (hidden networks)
    pub ssids: Vec<String>,
    /// Frequencies to scan in MHz; empty means all supported channels
    pub frequencies: Vec<u32>,
    pub randomize_mac: bool,
}

/// Minimum RSSI per band for a PNO match to be reported, in dBm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssiThresholds {
    pub min_2g_rssi: i32,
    pub min_5g_rssi: i32,
    pub min_6g_rssi: i32,
}

impl Default for RssiThresholds {
    fn default() -> Self {
        Self {
            min_2g_rssi: -80,
            min_5g_rssi: -77,
            min_6g_rssi: -77,
        }
    }
}

/// Caller's background (PNO) scan intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnoRequest {
    pub interval_ms: u32,
    /// SSIDs to actively probe for on each cycle
    #[serde(default)]
    pub scan_ssids: Vec<String>,
    /// SSIDs whose sighting should be reported
    #[serde(default)]
    pub match_ssids: Vec<String>,
    #[serde(default)]
    pub frequencies: Vec<u32>,
    #[serde(default)]
    pub rssi_thresholds: RssiThresholds,
}

impl PnoRequest {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            scan_ssids: Vec::new(),
            match_ssids: Vec::new(),
            frequencies: Vec::new(),
            rssi_thresholds: RssiThresholds::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.interval_ms > 0
    }
}

/// Normalized scan observation, identical whichever backend produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub bssid: String,
    pub ssid: String,
    pub frequency_mhz: u32,
    pub signal_dbm: i32,
    pub capability: u16,
    /// TSF timestamp reported by the radio, in microseconds
    pub timestamp_us: u64,
    pub associated: bool,
}

/// Scan result as returned by the kernel (nl80211 BSS attributes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeScanResult {
    pub ssid: Vec<u8>,
    pub bssid: [u8; 6],
    pub frequency: u32,
    /// Signal strength in mBm (100 * dBm)
    pub signal_mbm: i32,
    pub tsf: u64,
    pub capability: u16,
    pub associated: bool,
}

/// Scan result as returned by the offload firmware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadScanResult {
    pub ssid: Vec<u8>,
    pub bssid: [u8; 6],
    pub frequency: u32,
    pub rssi: i8,
    pub tsf: u64,
    pub capability: u16,
}

/// Format a MAC address as `aa:bb:cc:dd:ee:ff`
pub fn format_bssid(bssid: &[u8; 6]) -> String {
    bssid
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

impl From<&NativeScanResult> for ScanResult {
    fn from(raw: &NativeScanResult) -> Self {
        Self {
            bssid: format_bssid(&raw.bssid),
            ssid: String::from_utf8_lossy(&raw.ssid).into_owned(),
            frequency_mhz: raw.frequency,
            signal_dbm: raw.signal_mbm / 100,
            capability: raw.capability,
            timestamp_us: raw.tsf,
            associated: raw.associated,
        }
    }
}

impl From<&OffloadScanResult> for ScanResult {
    fn from(raw: &OffloadScanResult) -> Self {
        Self {
            bssid: format_bssid(&raw.bssid),
            ssid: String::from_utf8_lossy(&raw.ssid).into_owned(),
            frequency_mhz: raw.frequency,
            signal_dbm: raw.rssi as i32,
            capability: raw.capability,
            timestamp_us: raw.tsf,
            associated: false,
        }
    }
}

/// Which backend currently runs background scans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnoBackendKind {
    #[default]
    None,
    Offload,
    Netlink,
}

impl PnoBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PnoBackendKind::None => "none",
            PnoBackendKind::Offload => "offload",
            PnoBackendKind::Netlink => "netlink",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, PnoBackendKind::None)
    }
}

/// Snapshot of one interface's engine state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub interface: String,
    pub interface_index: u32,
    pub active_scan: bool,
    pub pno_backend: PnoBackendKind,
    pub defunct: bool,
}
