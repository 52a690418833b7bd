use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinSet,
    time::{MissedTickBehavior, interval},
};

use super::{ApiClient, Job};
use crate::config::JobsConfig;

/// Runs heartbeat, low-stock and report on their own timers until Ctrl-C.
///
/// Each tick runs in its own task, so a panic or a slow API call in one job
/// never holds up the others.
pub async fn run_daemon(client: Arc<dyn ApiClient>, config: JobsConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let mut timers = JoinSet::new();

    for (job, every) in [
        (Job::Heartbeat, config.heartbeat_every),
        (Job::LowStock, config.low_stock_every),
        (Job::Report, config.report_every),
    ] {
        tracing::info!(%job, every_secs = every.as_secs(), "scheduling job");
        timers.spawn(run_every(job, every, client.clone(), config.clone()));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping jobs");
    timers.abort_all();
    Ok(())
}

async fn run_every(job: Job, every: Duration, client: Arc<dyn ApiClient>, config: Arc<JobsConfig>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let client = client.clone();
        let config = config.clone();
        let tick = tokio::spawn(async move { job.run(client.as_ref(), &config).await });

        match tick.await {
            Ok(Ok(status)) => tracing::info!(%job, ?status, "job finished"),
            Ok(Err(err)) => tracing::error!(%job, error = %err, "job could not write its log"),
            Err(err) => tracing::error!(%job, error = %err, "job task aborted"),
        }
    }
}
