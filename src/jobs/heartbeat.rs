use std::io;

use chrono::Local;
use serde_json::json;

use super::{ApiClient, JobStatus, LogSink, log_sink::heartbeat_timestamp};
use crate::operations::Operation;

/// Appends one liveness line, then calls the API with `hello`. The line
/// is written whether or not the call succeeds.
pub async fn run(client: &dyn ApiClient, sink: &LogSink) -> io::Result<JobStatus> {
    let stamp = heartbeat_timestamp(Local::now());
    sink.append(&format!("{stamp} CRM is alive\n")).await?;

    match client.execute(Operation::Hello.name(), json!({})).await {
        Ok(greeting) => {
            tracing::info!(%greeting, "API endpoint is responsive");
            Ok(JobStatus::Success)
        }
        Err(err) => {
            tracing::error!(error = %err, "error checking API endpoint");
            Ok(JobStatus::Failed)
        }
    }
}
