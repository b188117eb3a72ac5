//! Wi-Fi scan daemon CLI
//!
//! A command-line tool for triggering scans, managing background (PNO)
//! scans and inspecting the state of the scan daemon.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{pno, scan, status};

/// Wi-Fi scan daemon CLI
#[derive(Parser)]
#[command(name = "scanctl")]
#[command(author, version, about = "CLI for the Wi-Fi scan daemon", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SCANCTL_API_URL env var)
    #[arg(long, env = "SCANCTL_API_URL")]
    pub api_url: Option<String>,

    /// Wireless interface to operate on (defaults to wlan0)
    #[arg(long, short)]
    pub interface: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Trigger a one-shot scan
    Scan {
        /// Scan type
        #[arg(long = "type", value_enum, default_value = "default")]
        scan_type: ScanTypeArg,

        /// Hidden SSID to probe for (repeatable)
        #[arg(long = "ssid")]
        ssids: Vec<String>,

        /// Frequency in MHz to scan (repeatable); all channels if omitted
        #[arg(long = "freq")]
        frequencies: Vec<u32>,

        /// Use a random MAC address if the driver supports it
        #[arg(long)]
        randomize_mac: bool,
    },

    /// Abort the scan in progress
    Abort,

    /// Show the latest one-shot scan results
    Results,

    /// Manage background (PNO) scans
    #[command(subcommand)]
    Pno(PnoCommands),

    /// Show daemon health and interface state
    Status,
}

#[derive(Subcommand)]
pub enum PnoCommands {
    /// Start background scanning
    Start {
        /// Base scan interval in milliseconds
        #[arg(long)]
        interval_ms: u32,

        /// SSID to actively probe for on each cycle (repeatable)
        #[arg(long = "ssid")]
        ssids: Vec<String>,

        /// SSID whose sighting should be reported (repeatable)
        #[arg(long = "match")]
        matches: Vec<String>,

        /// Frequency in MHz to scan (repeatable)
        #[arg(long = "freq")]
        frequencies: Vec<u32>,
    },

    /// Stop background scanning
    Stop,

    /// Show results from background scanning
    Results,
}

/// Scan types accepted by the daemon
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScanTypeArg {
    Default,
    LowSpan,
    LowPower,
    HighAccuracy,
}

impl ScanTypeArg {
    fn as_api_str(&self) -> &'static str {
        match self {
            ScanTypeArg::Default => "default",
            ScanTypeArg::LowSpan => "low_span",
            ScanTypeArg::LowPower => "low_power",
            ScanTypeArg::HighAccuracy => "high_accuracy",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load()?;
    let api_url = config.resolve_api_url(cli.api_url);
    let interface = config.resolve_interface(cli.interface);

    // Initialize client
    let client = client::ApiClient::new(&api_url)?;

    // Execute command
    match cli.command {
        Commands::Scan {
            scan_type,
            ssids,
            frequencies,
            randomize_mac,
        } => {
            let request = client::ScanRequest {
                scan_type: scan_type.as_api_str().to_string(),
                ssids,
                frequencies,
                randomize_mac,
            };
            scan::trigger_scan(&client, &interface, request, cli.format).await?;
        }
        Commands::Abort => {
            scan::abort_scan(&client, &interface, cli.format).await?;
        }
        Commands::Results => {
            scan::show_results(&client, &interface, cli.format).await?;
        }
        Commands::Pno(pno_cmd) => match pno_cmd {
            PnoCommands::Start {
                interval_ms,
                ssids,
                matches,
                frequencies,
            } => {
                let request = client::PnoStartRequest {
                    interval_ms,
                    scan_ssids: ssids,
                    match_ssids: matches,
                    frequencies,
                };
                pno::start(&client, &interface, request, cli.format).await?;
            }
            PnoCommands::Stop => {
                pno::stop(&client, &interface, cli.format).await?;
            }
            PnoCommands::Results => {
                pno::results(&client, &interface, cli.format).await?;
            }
        },
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
