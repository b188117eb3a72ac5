//! One-shot scan commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{interface_path, ApiClient, OkResponse, ScanRequest, ScanResult};
use crate::output::{
    color_signal, format_frequency, print_info, print_json, print_success, print_table,
    OutputFormat,
};

/// Row for scan results table
#[derive(Tabled, serde::Serialize)]
pub(crate) struct ScanResultRow {
    #[tabled(rename = "SSID")]
    ssid: String,
    #[tabled(rename = "BSSID")]
    bssid: String,
    #[tabled(rename = "Frequency")]
    frequency: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Associated")]
    associated: String,
}

impl From<&ScanResult> for ScanResultRow {
    fn from(result: &ScanResult) -> Self {
        Self {
            ssid: if result.ssid.is_empty() {
                "<hidden>".dimmed().to_string()
            } else {
                result.ssid.clone()
            },
            bssid: result.bssid.clone(),
            frequency: format_frequency(result.frequency_mhz),
            signal: color_signal(result.signal_dbm),
            associated: if result.associated {
                "yes".green().to_string()
            } else {
                "-".to_string()
            },
        }
    }
}

/// Print scan results, strongest signal first
pub(crate) fn print_results(mut results: Vec<ScanResult>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Table => {
            results.sort_by(|a, b| b.signal_dbm.cmp(&a.signal_dbm));
            let rows: Vec<ScanResultRow> = results.iter().map(ScanResultRow::from).collect();
            print_table(&rows, format);
            if !rows.is_empty() {
                println!("{} networks", rows.len());
            }
        }
    }
    Ok(())
}

/// Request a one-shot scan
pub async fn trigger_scan(
    client: &ApiClient,
    interface: &str,
    request: ScanRequest,
    format: OutputFormat,
) -> Result<()> {
    let response: OkResponse = client
        .post(&interface_path(interface, "scan"), &request)
        .await?;

    if let OutputFormat::Json = format {
        print_json(&response)?;
    }
    if !response.ok {
        anyhow::bail!("Scan request on {} was rejected", interface);
    }
    if let OutputFormat::Table = format {
        print_success(&format!(
            "Scan started on {} (type: {})",
            interface.cyan(),
            request.scan_type
        ));
        print_info(&format!("Fetch results with: scanctl -i {} results", interface));
    }
    Ok(())
}

/// Abort the scan in progress
pub async fn abort_scan(client: &ApiClient, interface: &str, format: OutputFormat) -> Result<()> {
    let response: OkResponse = client
        .post(&interface_path(interface, "scan/abort"), &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_success(&format!("Scan aborted on {}", interface.cyan())),
    }
    Ok(())
}

/// Show the latest one-shot scan results
pub async fn show_results(client: &ApiClient, interface: &str, format: OutputFormat) -> Result<()> {
    let results: Vec<ScanResult> = client
        .get(&interface_path(interface, "scan/results"))
        .await?;
    print_results(results, format)
}
