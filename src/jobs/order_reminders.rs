use std::{fmt::Write, io};

use chrono::{Duration, Local, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{ApiClient, ClientError, JobStatus, LogSink};
use crate::operations::Operation;

/// Orders placed within this many days get a reminder line.
pub const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct ReminderOrder {
    id: Uuid,
    customer: ReminderCustomer,
}

#[derive(Debug, Deserialize)]
struct ReminderCustomer {
    email: String,
}

/// Logs one line per recent order. If the order query fails nothing is
/// written and the run is reported as failed.
pub async fn run(client: &dyn ApiClient, sink: &LogSink) -> io::Result<JobStatus> {
    let orders = match recent_orders(client).await {
        Ok(orders) => orders,
        Err(err) => {
            tracing::error!(error = %err, "error fetching orders");
            return Ok(JobStatus::Failed);
        }
    };

    let stamp = Local::now().format("[%Y-%m-%d %H:%M:%S]").to_string();
    let mut entry = String::new();
    for order in &orders {
        let _ = writeln!(
            entry,
            "{stamp} Order ID: {}, Email: {}",
            order.id, order.customer.email
        );
    }
    if !entry.is_empty() {
        sink.append(&entry).await?;
    }

    tracing::info!(reminders = orders.len(), "order reminders processed");
    Ok(JobStatus::Success)
}

async fn recent_orders(client: &dyn ApiClient) -> Result<Vec<ReminderOrder>, ClientError> {
    let end = Utc::now();
    let start = end - Duration::days(LOOKBACK_DAYS);
    let variables = json!({
        "orderDateGte": start.to_rfc3339(),
        "orderDateLte": end.to_rfc3339(),
    });

    let data = client.execute(Operation::Orders.name(), variables).await?;
    serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))
}
