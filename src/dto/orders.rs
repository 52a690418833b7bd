use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{ContactInfo, Customer, Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderPayload {
    pub order: Order,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    #[serde(default)]
    pub order_date_gte: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_date_lte: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<&Customer> for OrderCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            full_name: customer.full_name(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithCustomer {
    #[serde(flatten)]
    pub order: Order,
    pub customer: OrderCustomer,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub product_name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[schema(value_type = String, example = "49.90")]
    pub price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub is_discounted: bool,
    pub is_high_value: bool,
    pub is_low_value: bool,
    pub is_recent_item: bool,
    pub is_old_item: bool,
    pub is_new_item: bool,
}

impl OrderItemDetail {
    pub fn evaluate(item: OrderItem, now: DateTime<Utc>) -> Self {
        Self {
            total_price: item.total_price(),
            is_discounted: item.is_discounted(),
            is_high_value: item.is_high_value(),
            is_low_value: item.is_low_value(),
            is_recent_item: item.is_recent_item(now),
            is_old_item: item.is_old_item(now),
            is_new_item: item.is_new_item(now),
            item,
        }
    }
}

/// An order with its derived properties, evaluated at request time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer_full_name: String,
    pub customer_contact_info: ContactInfo,
    pub is_active: bool,
    pub is_completed: bool,
    pub is_cancelled: bool,
    pub days_since_created: i64,
    pub days_since_updated: i64,
    pub is_recent: bool,
    pub is_old: bool,
    pub is_new_order: bool,
    pub is_returning_customer: bool,
    pub items: Vec<OrderItemDetail>,
}

impl OrderDetail {
    pub fn evaluate(
        order: Order,
        customer: &Customer,
        customer_orders: &[Order],
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_full_name: customer.full_name(),
            customer_contact_info: customer.contact_info(),
            is_active: order.is_active(),
            is_completed: order.is_completed(),
            is_cancelled: order.is_cancelled(),
            days_since_created: order.days_since_created(now),
            days_since_updated: order.days_since_updated(now),
            is_recent: order.is_recent(now),
            is_old: order.is_old(now),
            is_new_order: order.is_new_order(now),
            is_returning_customer: order.is_returning_customer(customer_orders),
            items: items
                .into_iter()
                .map(|item| OrderItemDetail::evaluate(item, now))
                .collect(),
            order,
        }
    }
}
