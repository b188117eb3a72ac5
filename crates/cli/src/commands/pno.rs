//! Background (PNO) scan commands

use anyhow::Result;
use colored::Colorize;

use crate::client::{interface_path, ApiClient, OkResponse, PnoStartRequest, ScanResult};
use crate::commands::scan::print_results;
use crate::output::{print_json, print_success, print_warning, OutputFormat};

/// Start background scanning
pub async fn start(
    client: &ApiClient,
    interface: &str,
    request: PnoStartRequest,
    format: OutputFormat,
) -> Result<()> {
    if request.match_ssids.is_empty() {
        print_warning("No --match SSIDs given; the radio will have nothing to report");
    }

    let response: OkResponse = client
        .post(&interface_path(interface, "pno/start"), &request)
        .await?;

    if let OutputFormat::Json = format {
        print_json(&response)?;
    }
    if !response.ok {
        anyhow::bail!("PNO start on {} was rejected", interface);
    }
    if let OutputFormat::Table = format {
        print_success(&format!(
            "PNO started on {} every {} ms ({} match SSIDs)",
            interface.cyan(),
            request.interval_ms,
            request.match_ssids.len()
        ));
    }
    Ok(())
}

/// Stop background scanning
pub async fn stop(client: &ApiClient, interface: &str, format: OutputFormat) -> Result<()> {
    let response: OkResponse = client
        .post(&interface_path(interface, "pno/stop"), &serde_json::json!({}))
        .await?;

    if let OutputFormat::Json = format {
        print_json(&response)?;
    }
    if !response.ok {
        anyhow::bail!("PNO stop on {} reported a failure", interface);
    }
    if let OutputFormat::Table = format {
        print_success(&format!("PNO stopped on {}", interface.cyan()));
    }
    Ok(())
}

/// Show results buffered by the active or last background scan
pub async fn results(client: &ApiClient, interface: &str, format: OutputFormat) -> Result<()> {
    let results: Vec<ScanResult> = client
        .get(&interface_path(interface, "pno/results"))
        .await?;
    print_results(results, format)
}
