use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderInput, CreateOrderItemRequest, CreateOrderPayload, OrderCustomer, OrderDetail,
        OrderItemDetail, OrderWithCustomer, OrdersQuery, UpdateOrderStatusRequest,
    },
    error::{AppError, AppResult},
    models::{Customer, Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    rules::{DeleteGuard, SaveRule, ensure_order_number_unchanged},
    state::AppState,
    store::{ORDER_NUMBER_FIELD, OrderFilter, StoreError},
};

/// Inserts tried before a taken order number is reported as a conflict.
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

/// Creates an order over a set of products. Repeated ids count once, every
/// distinct id must resolve, and the total is the sum of those prices.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderInput,
) -> AppResult<ApiResponse<CreateOrderPayload>> {
    if payload.product_ids.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one product must be selected.".into(),
        ));
    }

    let customer = state
        .store
        .get_customer(payload.customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid customer ID.".into()))?;

    let mut seen = HashSet::new();
    let product_ids: Vec<Uuid> = payload
        .product_ids
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    let products = state.store.get_products(&product_ids).await?;
    if products.len() != product_ids.len() {
        return Err(AppError::InvalidInput(
            "One or more product IDs are invalid.".into(),
        ));
    }
    let total_amount: Decimal = products.iter().map(|p| p.price).sum();

    let now = Utc::now();
    let mut order = Order::new(
        customer.id,
        String::new(),
        product_ids,
        total_amount,
        payload.order_date.unwrap_or(now),
        now,
    );
    order.order_number = build_order_number(order.id, now);
    order.validate_for_save()?;

    let mut attempt = 1;
    let order = loop {
        match state.store.insert_order(order.clone()).await {
            Ok(stored) => break stored,
            Err(StoreError::Duplicate {
                field: ORDER_NUMBER_FIELD,
            }) if attempt < ORDER_NUMBER_ATTEMPTS => {
                tracing::warn!(
                    order_number = %order.order_number,
                    attempt,
                    "order number already taken, regenerating"
                );
                order.order_number = build_order_number(Uuid::new_v4(), now);
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };
    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total_amount,
        "order created"
    );

    Ok(ApiResponse::success(
        "Order created",
        CreateOrderPayload { order },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    query: OrdersQuery,
) -> AppResult<ApiResponse<Vec<OrderWithCustomer>>> {
    let filter = OrderFilter {
        order_date_gte: query.order_date_gte,
        order_date_lte: query.order_date_lte,
        ..OrderFilter::default()
    };
    let orders = state.store.list_orders(&filter).await?;

    let mut customers: HashMap<Uuid, Customer> = HashMap::new();
    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        if !customers.contains_key(&order.customer_id) {
            let customer = state
                .store
                .get_customer(order.customer_id)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("order {} references a missing customer", order.id)
                })?;
            customers.insert(customer.id, customer);
        }
        let customer = OrderCustomer::from(&customers[&order.customer_id]);
        items.push(OrderWithCustomer { order, customer });
    }

    let total = items.len() as i64;
    Ok(ApiResponse::success("Orders", items, Some(Meta::with_total(total))))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderDetail>> {
    let order = find_order(state, id).await?;
    let customer = state
        .store
        .get_customer(order.customer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    let customer_orders = state
        .store
        .list_orders(&OrderFilter::for_customer(customer.id))
        .await?;
    let items = state.store.list_order_items(order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderDetail::evaluate(order, &customer, &customer_orders, items, Utc::now()),
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = payload
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::InvalidInput)?;

    let stored = find_order(state, id).await?;
    let mut order = stored.clone();
    order.status = status;
    order.touch(Utc::now());
    ensure_order_number_unchanged(&stored, &order)?;
    order.validate_for_save()?;

    let order = state.store.update_order(order).await?;
    tracing::info!(order_id = %order.id, status = %order.status, "order status updated");

    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = find_order(state, id).await?;
    order.validate_for_delete(&())?;

    if !state.store.delete_order(id).await? {
        return Err(AppError::not_found("Order"));
    }
    tracing::info!(order_id = %id, "order deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn create_order_item(
    state: &AppState,
    order_id: Uuid,
    payload: CreateOrderItemRequest,
) -> AppResult<ApiResponse<OrderItemDetail>> {
    let order = find_order(state, order_id).await?;

    let now = Utc::now();
    let item = OrderItem::new(order.id, payload.product_name, payload.quantity, payload.price, now);
    item.validate_for_save()?;
    let item = state.store.insert_order_item(item).await?;
    tracing::info!(order_id = %order.id, item_id = %item.id, "order item added");

    Ok(ApiResponse::success(
        "Order item created",
        OrderItemDetail::evaluate(item, now),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_item(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let item = state
        .store
        .get_order_item(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order item"))?;
    let parent = find_order(state, item.order_id).await?;
    item.validate_for_delete(&parent)?;

    if !state.store.delete_order_item(id).await? {
        return Err(AppError::not_found("Order item"));
    }
    tracing::info!(item_id = %id, order_id = %parent.id, "order item deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

async fn find_order(state: &AppState, id: Uuid) -> AppResult<Order> {
    state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

/// `ORD-YYYYMMDD-` followed by the first 7 hex digits of `seed`.
fn build_order_number(seed: Uuid, now: DateTime<Utc>) -> String {
    let date = now.format("%Y%m%d");
    let suffix = seed.simple().to_string();
    format!("ORD-{}-{}", date, &suffix[..7])
}
