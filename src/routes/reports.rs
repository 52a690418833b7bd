use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::reports::ReportSummary, error::AppResult, response::ApiResponse,
    services::report_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    responses(
        (status = 200, description = "Customer, order and revenue totals", body = ApiResponse<ReportSummary>)
    ),
    tag = "Reports"
)]
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ReportSummary>>> {
    let res = report_service::summary(&state).await?;
    Ok(Json(res))
}
