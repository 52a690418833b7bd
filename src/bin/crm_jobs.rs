use std::{process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_backend::{
    config::JobsConfig,
    jobs::{ApiClient, HttpApiClient, Job, scheduler},
};

/// Scheduled CRM jobs. Each subcommand runs one job and exits, except
/// `daemon`, which keeps the timer-driven jobs running.
#[derive(Debug, Parser)]
#[command(name = "crm-jobs", version, about)]
struct Cli {
    /// Overrides CRM_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Append a liveness line and ping the API.
    Heartbeat,
    /// Restock products below the low-stock threshold.
    LowStock,
    /// Log reminders for orders from the last 7 days.
    OrderReminders,
    /// Append a customer, order and revenue summary.
    Report,
    /// Run heartbeat, low-stock and report on their timers until Ctrl-C.
    Daemon,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crm_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = JobsConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let client: Arc<dyn ApiClient> = Arc::new(HttpApiClient::from_config(&config)?);

    let job = match cli.command {
        Command::Heartbeat => Job::Heartbeat,
        Command::LowStock => Job::LowStock,
        Command::OrderReminders => Job::OrderReminders,
        Command::Report => Job::Report,
        Command::Daemon => {
            scheduler::run_daemon(client, config).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let status = job.run(client.as_ref(), &config).await?;
    tracing::info!(%job, ?status, log = %job.log_path(&config).display(), "job finished");
    Ok(ExitCode::from(status.exit_code()))
}
