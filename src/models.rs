use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stock level below which a product counts as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;
/// Units added to each low-stock product by a restock sweep.
pub const RESTOCK_AMOUNT: i32 = 10;

const RECENT_DAYS: i64 = 30;
const NEW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone_number: Option<String>,
}

impl Customer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone_number,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn contact_info(&self) -> ContactInfo {
        ContactInfo {
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }

    pub fn is_new_customer(&self, now: DateTime<Utc>) -> bool {
        self.created_at >= now - Duration::days(RECENT_DAYS)
    }

    // The order-based properties below only look at orders owned by this
    // customer, so callers may pass an unfiltered slice.

    pub fn order_count(&self, orders: &[Order]) -> usize {
        self.owned(orders).count()
    }

    pub fn has_orders(&self, orders: &[Order]) -> bool {
        self.owned(orders).next().is_some()
    }

    pub fn is_active(&self, orders: &[Order]) -> bool {
        self.owned(orders).any(Order::is_active)
    }

    pub fn last_order_date(&self, orders: &[Order]) -> Option<DateTime<Utc>> {
        self.owned(orders).map(|order| order.created_at).max()
    }

    /// Up to five most recently created orders, newest first.
    pub fn recent_orders<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        let mut owned: Vec<&Order> = self.owned(orders).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(5);
        owned
    }

    fn owned<'a>(&self, orders: &'a [Order]) -> impl Iterator<Item = &'a Order> {
        let id = self.id;
        orders.iter().filter(move |order| order.customer_id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price: Decimal,
        stock: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            price,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(OrderStatus::Active),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Invalid order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    #[schema(value_type = String, example = "15.50")]
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: Uuid,
        order_number: impl Into<String>,
        product_ids: Vec<Uuid>,
        total_amount: Decimal,
        order_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            order_number: order_number.into(),
            status: OrderStatus::Active,
            total_amount,
            order_date,
            product_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    pub fn days_since_created(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days()
    }

    pub fn days_since_updated(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated_at).num_days()
    }

    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        self.days_since_created(now) <= RECENT_DAYS
    }

    pub fn is_old(&self, now: DateTime<Utc>) -> bool {
        self.days_since_created(now) > RECENT_DAYS
    }

    pub fn is_new_order(&self, now: DateTime<Utc>) -> bool {
        self.created_at >= now - Duration::days(NEW_DAYS)
    }

    /// True when the owning customer has more than one completed order.
    pub fn is_returning_customer(&self, customer_orders: &[Order]) -> bool {
        customer_orders
            .iter()
            .filter(|order| order.customer_id == self.customer_id && order.is_completed())
            .count()
            > 1
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "49.90")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn new(
        order_id: Uuid,
        product_name: impl Into<String>,
        quantity: i32,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_name: product_name.into(),
            quantity,
            price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_price(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }

    pub fn is_discounted(&self) -> bool {
        self.price < Decimal::from(100)
    }

    pub fn is_high_value(&self) -> bool {
        self.price > Decimal::from(500)
    }

    pub fn is_low_value(&self) -> bool {
        self.price < Decimal::from(50)
    }

    pub fn is_recent_item(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_days() <= RECENT_DAYS
    }

    pub fn is_old_item(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_days() > RECENT_DAYS
    }

    pub fn is_new_item(&self, now: DateTime<Utc>) -> bool {
        self.created_at >= now - Duration::days(NEW_DAYS)
    }
}
