use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::customers::{
        BulkCreateCustomersInput, BulkCreateCustomersPayload, CreateCustomerInput,
        CreateCustomerPayload, CustomerDetail,
    },
    error::AppResult,
    response::ApiResponse,
    services::customer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer))
        .route("/bulk", post(bulk_create_customers))
        .route("/{id}", get(get_customer).delete(delete_customer))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerInput,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<CreateCustomerPayload>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerInput>,
) -> AppResult<Json<ApiResponse<CreateCustomerPayload>>> {
    let res = customer_service::create_customer(&state, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/api/customers/bulk",
    request_body = BulkCreateCustomersInput,
    responses(
        (status = 200, description = "Per-entry results", body = ApiResponse<BulkCreateCustomersPayload>)
    ),
    tag = "Customers"
)]
pub async fn bulk_create_customers(
    State(state): State<AppState>,
    Json(payload): Json<BulkCreateCustomersInput>,
) -> AppResult<Json<ApiResponse<BulkCreateCustomersPayload>>> {
    let res = customer_service::bulk_create_customers(&state, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer with derived properties", body = ApiResponse<CustomerDetail>),
        (status = 404, description = "Customer not found")
    ),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerDetail>>> {
    let res = customer_service::get_customer(&state, id).await?;
    Ok(Json(res))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer still has orders")
    ),
    tag = "Customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let res = customer_service::delete_customer(&state, id).await?;
    Ok(Json(res))
}
