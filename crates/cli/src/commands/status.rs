//! Daemon and interface status

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::client::{ApiClient, HealthSummary, InterfaceStatus};
use crate::output::{color_status, format_timestamp, print_json, print_table, OutputFormat};

/// Row for interfaces table
#[derive(Tabled, Serialize)]
struct InterfaceRow {
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Index")]
    index: u32,
    #[tabled(rename = "Scan")]
    scan: String,
    #[tabled(rename = "PNO Backend")]
    pno_backend: String,
}

/// Row for component health table
#[derive(Tabled, Serialize)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Checked")]
    checked: String,
}

#[derive(Serialize)]
struct StatusReport {
    health: HealthSummary,
    interfaces: Vec<InterfaceStatus>,
}

fn interface_row(status: &InterfaceStatus) -> InterfaceRow {
    let scan = if status.defunct {
        "defunct"
    } else if status.active_scan {
        "scanning"
    } else {
        "idle"
    };
    InterfaceRow {
        interface: status.interface.clone(),
        index: status.interface_index,
        scan: color_status(scan),
        pno_backend: color_status(&status.pno_backend),
    }
}

/// Show daemon health and per-interface engine state
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;
    let interfaces: Vec<InterfaceStatus> = client.get("v1/interfaces").await?;

    match format {
        OutputFormat::Json => print_json(&StatusReport { health, interfaces })?,
        OutputFormat::Table => {
            println!("{} {}", "Daemon:".bold(), color_status(&health.status));
            println!();

            let rows: Vec<InterfaceRow> = interfaces.iter().map(interface_row).collect();
            print_table(&rows, format);
            println!();

            let mut components: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, c)| ComponentRow {
                    component: name.clone(),
                    status: color_status(&c.status),
                    message: c.message.clone().unwrap_or_default(),
                    checked: format_timestamp(c.last_check_timestamp),
                })
                .collect();
            components.sort_by(|a, b| a.component.cmp(&b.component));
            print_table(&components, format);
        }
    }
    Ok(())
}
