use rust_decimal::Decimal;

use crate::{
    dto::reports::{DEFAULT_GREETING, HelloInput, ReportSummary},
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Liveness check used by the heartbeat job.
pub fn hello(input: HelloInput) -> String {
    let greeting = input.greeting.unwrap_or_else(|| DEFAULT_GREETING.to_string());
    format!("{greeting}!")
}

pub async fn total_customers(state: &AppState) -> AppResult<u64> {
    Ok(state.store.count_customers().await?)
}

pub async fn total_orders(state: &AppState) -> AppResult<u64> {
    Ok(state.store.count_orders().await?)
}

pub async fn total_revenue(state: &AppState) -> AppResult<Decimal> {
    Ok(state.store.sum_order_totals().await?)
}

pub async fn summary(state: &AppState) -> AppResult<ApiResponse<ReportSummary>> {
    let summary = ReportSummary {
        total_customers: total_customers(state).await?,
        total_orders: total_orders(state).await?,
        total_revenue: total_revenue(state).await?,
    };
    Ok(ApiResponse::success("Report", summary, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_appends_exclamation() {
        assert_eq!(hello(HelloInput::default()), "Hello, GraphQL!");
        assert_eq!(
            hello(HelloInput {
                greeting: Some("Hi".into())
            }),
            "Hi!"
        );
    }
}
