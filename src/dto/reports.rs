use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_GREETING: &str = "Hello, GraphQL";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct HelloInput {
    #[serde(default, alias = "greetings")]
    pub greeting: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_customers: u64,
    pub total_orders: u64,
    #[schema(value_type = String, example = "1250.00")]
    pub total_revenue: Decimal,
}
