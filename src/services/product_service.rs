use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductInput, CreateProductPayload, ProductDetail, RestockPayload},
    error::{AppError, AppResult},
    models::{LOW_STOCK_THRESHOLD, Product, RESTOCK_AMOUNT},
    response::{ApiResponse, Meta},
    rules::{DeleteGuard, SaveRule},
    state::AppState,
};

/// Rejects a zero price even though a stored product may be free; the
/// save rule only forbids negative prices.
pub async fn create_product(
    state: &AppState,
    payload: CreateProductInput,
) -> AppResult<ApiResponse<CreateProductPayload>> {
    if payload.price <= Decimal::ZERO {
        return Err(AppError::InvalidInput("Price must be a positive number.".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::InvalidInput("Stock cannot be negative.".into()));
    }

    let product = Product::new(
        payload.name,
        payload.description,
        payload.price,
        payload.stock,
        Utc::now(),
    );
    product.validate_for_save()?;
    let product = state.store.insert_product(product).await?;
    tracing::info!(product_id = %product.id, "product created");

    Ok(ApiResponse::success(
        "Product created",
        CreateProductPayload { product },
        Some(Meta::empty()),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success("Product", ProductDetail::from(product), None))
}

pub async fn delete_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    product.validate_for_delete(&())?;

    if !state.store.delete_product(id).await? {
        return Err(AppError::not_found("Product"));
    }
    tracing::info!(product_id = %id, "product deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

/// Adds a fixed amount to every product below the low-stock threshold.
/// The increment is applied to the stored stock in a single store call.
pub async fn update_low_stock_products(state: &AppState) -> AppResult<ApiResponse<RestockPayload>> {
    let updated_products = state
        .store
        .restock_below(LOW_STOCK_THRESHOLD, RESTOCK_AMOUNT, Utc::now())
        .await?;

    let message = format!("{} product(s) restocked.", updated_products.len());
    tracing::info!(restocked = updated_products.len(), "low-stock sweep finished");

    let total = updated_products.len() as i64;
    Ok(ApiResponse::success(
        message.clone(),
        RestockPayload {
            updated_products,
            message,
        },
        Some(Meta::with_total(total)),
    ))
}
