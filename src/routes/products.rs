use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductInput, CreateProductPayload, ProductDetail, RestockPayload},
    error::AppResult,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/restock", post(restock_low_stock))
        .route("/{id}", get(get_product).delete(delete_product))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductInput,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<CreateProductPayload>),
        (status = 400, description = "Invalid input")
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> AppResult<Json<ApiResponse<CreateProductPayload>>> {
    let res = product_service::create_product(&state, payload).await?;
    Ok(Json(res))
}

#[utoipa::path(
    post,
    path = "/api/products/restock",
    responses(
        (status = 200, description = "Low-stock products restocked", body = ApiResponse<RestockPayload>)
    ),
    tag = "Products"
)]
pub async fn restock_low_stock(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RestockPayload>>> {
    let res = product_service::update_low_stock_products(&state).await?;
    Ok(Json(res))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with stock flags", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let res = product_service::get_product(&state, id).await?;
    Ok(Json(res))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product still has stock")
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let res = product_service::delete_product(&state, id).await?;
    Ok(Json(res))
}
