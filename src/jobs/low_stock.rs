use std::{fmt::Write, io};

use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::{ApiClient, ClientError, JobStatus, LogSink, log_sink::precise_timestamp};
use crate::operations::Operation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockResult {
    message: String,
    updated_products: Vec<RestockedProduct>,
}

#[derive(Debug, Deserialize)]
struct RestockedProduct {
    name: String,
    stock: i32,
}

/// Triggers the restock sweep and records what changed. Failures are
/// written to the log; the job itself always succeeds.
pub async fn run(client: &dyn ApiClient, sink: &LogSink) -> io::Result<JobStatus> {
    let stamp = precise_timestamp(Local::now());

    let entry = match restock(client).await {
        Ok(result) => {
            tracing::info!(restocked = result.updated_products.len(), "low-stock sweep done");
            let mut entry = format!("{stamp} - {}\n", result.message);
            for product in &result.updated_products {
                let _ = writeln!(
                    entry,
                    " - {} updated to stock: {}",
                    product.name, product.stock
                );
            }
            entry
        }
        Err(err) => {
            tracing::error!(error = %err, "low-stock sweep failed");
            format!("{stamp} - Exception occurred: {err}\n")
        }
    };

    sink.append(&entry).await?;
    Ok(JobStatus::Success)
}

async fn restock(client: &dyn ApiClient) -> Result<RestockResult, ClientError> {
    let data = client
        .execute(Operation::UpdateLowStockProducts.name(), json!({}))
        .await?;
    serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
}
