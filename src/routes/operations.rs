use axum::{Json, Router, extract::State, routing::post};

use crate::{
    operations::{self, OperationRequest, OperationResponse},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(execute))
}

/// Runs one named operation. Failures are reported in `errors` with a 200
/// status, so a client only has to inspect the body.
#[utoipa::path(
    post,
    path = "/api/execute",
    request_body = OperationRequest,
    responses(
        (status = 200, description = "Operation result", body = OperationResponse)
    ),
    tag = "Operations"
)]
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<OperationRequest>,
) -> Json<OperationResponse> {
    match operations::execute(&state, &request.operation, request.variables).await {
        Ok(data) => Json(OperationResponse::ok(data)),
        Err(err) => {
            if err.status().is_server_error() {
                tracing::error!(operation = %request.operation, error = ?err, "operation failed");
            } else {
                tracing::warn!(
                    operation = %request.operation,
                    code = err.code(),
                    error = %err,
                    "operation rejected"
                );
            }
            Json(OperationResponse::failed(&err))
        }
    }
}
