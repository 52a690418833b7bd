use std::io;

use chrono::Local;
use serde_json::{Value, json};

use super::{
    ApiClient, ClientError, JobStatus, LogSink,
    log_sink::{precise_timestamp, report_timestamp},
};
use crate::operations::Operation;

struct Totals {
    customers: u64,
    orders: u64,
    revenue: String,
}

/// Appends a one-line summary of customer, order and revenue totals.
pub async fn run(client: &dyn ApiClient, sink: &LogSink) -> io::Result<JobStatus> {
    let entry = match totals(client).await {
        Ok(totals) => format!(
            "{} - Report: {} customers, {} orders, {} revenue\n",
            report_timestamp(Local::now()),
            totals.customers,
            totals.orders,
            totals.revenue
        ),
        Err(err) => {
            tracing::error!(error = %err, "report query failed");
            format!("{} - GraphQL Error: {err}\n", precise_timestamp(Local::now()))
        }
    };

    sink.append(&entry).await?;
    Ok(JobStatus::Success)
}

async fn totals(client: &dyn ApiClient) -> Result<Totals, ClientError> {
    let customers = client
        .execute(Operation::TotalCustomers.name(), json!({}))
        .await?;
    let orders = client.execute(Operation::TotalOrders.name(), json!({})).await?;
    let revenue = client.execute(Operation::TotalRevenue.name(), json!({})).await?;

    Ok(Totals {
        customers: count(&customers)?,
        orders: count(&orders)?,
        revenue: scalar_text(&revenue),
    })
}

fn count(value: &Value) -> Result<u64, ClientError> {
    value
        .as_u64()
        .ok_or_else(|| ClientError::Decode(format!("expected a count, got {value}")))
}

/// Decimals arrive as JSON strings; print them without the quotes.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
