//! Scheduled jobs that drive the API through an [`ApiClient`] and append
//! their results to plain-text log files.
//!
//! Each job is a single stateless run. The `crm-jobs` binary runs one job
//! per invocation for an external scheduler, or all timer-driven jobs at
//! once through [`scheduler::run_daemon`].

use std::{fmt, io, path::Path};

use crate::config::JobsConfig;

pub mod client;
pub mod heartbeat;
pub mod log_sink;
pub mod low_stock;
pub mod order_reminders;
pub mod report;
pub mod scheduler;

pub use client::{ApiClient, ClientError, HttpApiClient};
pub use log_sink::LogSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Success,
    Failed,
}

impl JobStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            JobStatus::Success => 0,
            JobStatus::Failed => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Heartbeat,
    LowStock,
    OrderReminders,
    Report,
}

impl Job {
    pub fn log_path(self, config: &JobsConfig) -> &Path {
        match self {
            Job::Heartbeat => &config.heartbeat_log,
            Job::LowStock => &config.low_stock_log,
            Job::OrderReminders => &config.order_reminders_log,
            Job::Report => &config.report_log,
        }
    }

    /// Runs the job once. Only a failure to write the log file is an error;
    /// API failures end up in the log or in the returned status.
    pub async fn run(self, client: &dyn ApiClient, config: &JobsConfig) -> io::Result<JobStatus> {
        let sink = LogSink::new(self.log_path(config));
        match self {
            Job::Heartbeat => heartbeat::run(client, &sink).await,
            Job::LowStock => low_stock::run(client, &sink).await,
            Job::OrderReminders => order_reminders::run(client, &sink).await,
            Job::Report => report::run(client, &sink).await,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Job::Heartbeat => "heartbeat",
            Job::LowStock => "low-stock",
            Job::OrderReminders => "order-reminders",
            Job::Report => "report",
        })
    }
}
