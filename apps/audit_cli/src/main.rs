use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use audit_client::{AuditClient, SessionState};
use clap::Parser;
use shared::domain::{CriterionId, QualiopiOnboardingData};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod render;

use config::{load_settings, DEFAULT_SETTINGS_FILE};

#[derive(Parser, Debug)]
#[command(about = "Run a Qualiopi readiness audit and follow its progress")]
struct Args {
    /// Base URL of the audit API (the start endpoint is resolved below it).
    #[arg(long)]
    server_url: Option<String>,
    /// JSON file describing the organization being audited.
    #[arg(long)]
    onboarding: Option<PathBuf>,
    #[arg(long)]
    chat_session_id: Option<String>,
    /// Restrict the audit to these criterion ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    criteria: Vec<i64>,
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Print the final session snapshot as JSON instead of the text summary.
    #[arg(long)]
    json: bool,
}

async fn read_onboarding(path: &Path) -> Result<QualiopiOnboardingData> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read onboarding file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid onboarding data in '{}'", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config)?;
    let server_url = args.server_url.unwrap_or(settings.server_url);
    let onboarding_path = args
        .onboarding
        .or(settings.onboarding_path)
        .context("no onboarding file; pass --onboarding or set APP__ONBOARDING_PATH")?;
    let chat_session_id = args
        .chat_session_id
        .or(settings.chat_session_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let criteria = (!args.criteria.is_empty())
        .then(|| args.criteria.iter().copied().map(CriterionId).collect::<Vec<_>>());

    let client = AuditClient::http(&server_url)
        .with_context(|| format!("cannot use server url '{server_url}'"))?;
    client
        .set_onboarding_data(read_onboarding(&onboarding_path).await?)
        .await?;

    info!(%server_url, %chat_session_id, "starting audit");
    let mut events = client.subscribe_events();
    let outcome = {
        let run = client.run(&chat_session_id, criteria);
        tokio::pin!(run);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                outcome = &mut run => break outcome,
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(line) = render::describe_event(&event) {
                            println!("{line}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "progress output lagged"),
                    Err(RecvError::Closed) => {}
                },
                _ = &mut ctrl_c => {
                    // Leaving this block drops the pending run and its connection.
                    let state = client.cancel().await;
                    info!(?state, "audit cancelled by user");
                    break Ok(state);
                }
            }
        }
    };

    while let Ok(event) = events.try_recv() {
        if let Some(line) = render::describe_event(&event) {
            println!("{line}");
        }
    }

    let snapshot = client.snapshot().await;
    let state = match outcome {
        Err(err) if snapshot.state == SessionState::Completed => {
            warn!(%err, "stream failed after the final report");
            snapshot.state
        }
        outcome => outcome.context("audit failed")?,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render::render_summary(&snapshot));
    }
    if state != SessionState::Completed {
        warn!(?state, "audit ended without a final report");
    }
    Ok(())
}
