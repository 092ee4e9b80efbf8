use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use cisdash::client::{DashboardApi, DashboardClient};
use cisdash::config::Config;
use cisdash::render::memory::MemorySurface;
use cisdash::render::terminal::{TerminalScanSurface, TerminalSurface};
use cisdash::render::{render_fetch_error, render_report, RenderSurface};
use cisdash::report::build::{build_report, load_findings};
use cisdash::report::FetchedReport;
use cisdash::scan::{ScanController, ScanState};

/// cisdash: dashboard for CIS Kubernetes compliance scans.
///
/// Shows the latest scan report from a cisdash backend and can trigger a
/// fresh scan job.
#[derive(Parser)]
#[command(name = "cisdash", version, about)]
struct Cli {
    /// Backend base URL (overrides CISDASH_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the processed report and render the dashboard
    Show {
        /// Expand every failed check's details (remediation, line results)
        #[arg(long)]
        details: bool,

        /// Also print the raw report JSON
        #[arg(long)]
        raw: bool,

        /// Print the rendered dashboard as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Build the report from a local scanner results file instead of fetching
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Start a scan job and wait for it to finish
    Scan {
        /// Don't re-render the dashboard once the scan completes
        #[arg(long)]
        no_reload: bool,

        /// Expand failed check details when re-rendering
        #[arg(long)]
        details: bool,
    },

    /// Run the dashboard backend (processed report, scan job control, runtime alerts)
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout is the dashboard.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cisdash=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.url {
        config.base_url = url;
    }
    config.validate()?;

    match cli.command {
        Commands::Show {
            details,
            raw,
            json,
            file,
        } => {
            let report = match &file {
                Some(path) => Ok(report_from_file(path).await?),
                None => {
                    let client = DashboardClient::new(&config.base_url)?;
                    client.fetch_processed().await
                }
            };
            let source = match &file {
                Some(path) => path.display().to_string(),
                None => config.base_url.clone(),
            };

            if json {
                let mut surface = MemorySurface::new();
                draw(&report, &mut surface);
                println!("{}", serde_json::to_string_pretty(&surface)?);
            } else {
                let mut surface = TerminalSurface::new(&source, details, raw);
                draw(&report, &mut surface);
                surface.print();
            }
        }

        Commands::Scan { no_reload, details } => {
            let client = DashboardClient::new(&config.base_url)?;
            let mut surface = TerminalScanSurface::new();

            println!("Triggering scan on {}...", config.base_url);

            let state = {
                let mut controller =
                    ScanController::new(&client, &mut surface, config.scan_config());
                tokio::select! {
                    state = controller.run() => state,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, no longer watching the scan");
                        ScanState::Idle
                    }
                }
            };
            surface.finish();

            match state {
                ScanState::Completed if surface.reload_requested() && !no_reload => {
                    let report = client.fetch_processed().await;
                    let mut dashboard = TerminalSurface::new(&config.base_url, details, false);
                    draw(&report, &mut dashboard);
                    dashboard.print();
                }
                ScanState::Completed => println!("\n{}", "Scan complete.".bold()),
                ScanState::Idle => println!(
                    "{}",
                    "The scan job keeps running on the cluster.".dimmed()
                ),
                other => error!(state = %other, "Scan did not complete"),
            }
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            cisdash::web::run_server(config, port, &bind).await?;
        }
    }

    Ok(())
}

/// Render a fetched report, or the fetch error in its place.
fn draw(
    report: &Result<FetchedReport, cisdash::client::FetchError>,
    surface: &mut dyn RenderSurface,
) {
    match report {
        Ok(report) => render_report(report, surface),
        Err(e) => {
            error!(error = %e, "Failed to fetch processed data");
            render_fetch_error(e, surface);
        }
    }
}

async fn report_from_file(path: &Path) -> Result<FetchedReport> {
    let findings = load_findings(path).await?;
    info!(findings = findings.len(), path = %path.display(), "Loaded scanner results");
    Ok(build_report(&findings, &path.display().to_string()).into())
}
