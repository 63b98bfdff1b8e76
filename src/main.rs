use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use voice_health_dashboard::view::{render_analysis_text, render_history_text};
use voice_health_dashboard::{
    build_analysis_view, build_chart_payload, build_snapshot_json, load_config, render_snapshot_text,
    AnalysisClient, Dashboard, DashboardSnapshot,
};

#[derive(Parser)]
#[command(name = "voice-health-dashboard", about = "Patient voice health dashboard", version)]
struct Cli {
    /// Patient to show (overrides PATIENT_ID)
    #[arg(long, global = true)]
    patient: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Latest analysis and history
    Show,
    /// Latest analysis only
    Latest,
    /// Per-metric history series
    History,
    /// Submit a voice sample (.wav, .mp3, .flac), then show the refreshed dashboard
    Upload { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config()?;

    let patient_id = cli
        .patient
        .clone()
        .or_else(|| cfg.patient_id.clone())
        .ok_or_else(|| anyhow!("PATIENT_ID env var or --patient must be set"))?;
    info!("patient = {}, service = {}", patient_id, cfg.api_base_url);

    let client = AnalysisClient::new(&cfg)?;
    let mut dashboard = Dashboard::new(client, patient_id, cfg.history_ordering);

    let command = cli.command.unwrap_or(Command::Show);
    if let Command::Upload { file } = &command {
        let outcome = dashboard.submit_sample(file).await;
        match &outcome.upload {
            Ok(receipt) => info!("voice sample accepted (HTTP {})", receipt.status),
            Err(e) => error!("{}", e),
        }
        for e in outcome.refresh.errors() {
            error!("{}", e);
        }
        print_snapshot(&dashboard.snapshot(), &Command::Show, cli.json)?;
        if let Err(e) = outcome.upload {
            return Err(e.into());
        }
        return Ok(());
    }

    let outcome = dashboard.refresh().await;
    for e in outcome.errors() {
        error!("{}", e);
    }
    print_snapshot(&dashboard.snapshot(), &command, cli.json)?;

    if !outcome.is_complete() && dashboard.snapshot().latest.is_none() && dashboard.snapshot().history.is_empty() {
        return Err(anyhow!("no dashboard data could be loaded"));
    }
    Ok(())
}

fn print_snapshot(snapshot: &DashboardSnapshot, command: &Command, json: bool) -> Result<()> {
    let output = match (command, json) {
        (Command::Latest, true) => serde_json::to_string_pretty(&snapshot.latest.as_ref().map(build_analysis_view))?,
        (Command::Latest, false) => snapshot
            .latest
            .as_ref()
            .map(render_analysis_text)
            .unwrap_or_else(|| "No analysis available.".to_string()),
        (Command::History, true) => serde_json::to_string_pretty(&build_chart_payload(&snapshot.series))?,
        (Command::History, false) => render_history_text(&snapshot.series),
        (_, true) => serde_json::to_string_pretty(&build_snapshot_json(snapshot))?,
        (_, false) => render_snapshot_text(snapshot),
    };
    println!("{}", output);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
