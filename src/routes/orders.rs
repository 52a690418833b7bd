use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderInput, CreateOrderItemRequest, CreateOrderPayload, OrderDetail,
        OrderItemDetail, OrderWithCustomer, OrdersQuery, UpdateOrderStatusRequest,
    },
    error::AppResult,
    models::Order,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order).delete(delete_order))
        .route("/{id}/status", patch(update_order_status))
        .route("/{id}/items", post(create_order_item))
}

pub fn item_router() -> Router<AppState> {
    Router::new().route("/{id}", delete(delete_order_item))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("orderDateGte" = Option<String>, Query, description = "Earliest order date, RFC 3339"),
        ("orderDateLte" = Option<String>, Query, description = "Latest order date, RFC 3339"),
    ),
    responses(
        (status = 200, description = "Orders, newest first", body = ApiResponse<Vec<OrderWithCustomer>>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> AppResult<Json<ApiResponse<Vec<OrderWithCustomer>>>> {
    let res = order_service::list_orders(&state, query).await?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderInput,
    responses(
        (status = 200, description = "Order created", body = ApiResponse<CreateOrderPayload>),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Unknown customer")
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderInput>,
) -> AppResult<Json<ApiResponse<CreateOrderPayload>>> {
    let res = order_service::create_order(&state, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items and derived properties", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let res = order_service::get_order(&state, id).await?;
    Ok(Json(res))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order status"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let res = order_service::update_order_status(&state, id, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is still active")
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let res = order_service::delete_order(&state, id).await?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/items",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = CreateOrderItemRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<OrderItemDetail>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn create_order_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateOrderItemRequest>,
) -> AppResult<Json<ApiResponse<OrderItemDetail>>> {
    let res = order_service::create_order_item(&state, id, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    delete,
    path = "/api/order-items/{id}",
    params(("id" = Uuid, Path, description = "Order item id")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 404, description = "Order item not found"),
        (status = 409, description = "Parent order is completed")
    ),
    tag = "Orders"
)]
pub async fn delete_order_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let res = order_service::delete_order_item(&state, id).await?;
    Ok(Json(res))
}
