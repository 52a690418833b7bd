//! Persistence seam for the CRM entities.
//!
//! Handlers only talk to [`CrmStore`]. Backends must enforce uniqueness of
//! `Customer.email` and `Order.order_number` atomically and reject a
//! duplicate write with [`StoreError::Duplicate`], whatever the caller
//! checked beforehand. Likewise a customer who owns orders is never removed,
//! and restocking adds to the stored value instead of overwriting it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Customer, Order, OrderItem, OrderStatus, Product};

pub mod memory;
pub mod orm;

pub use memory::MemoryStore;
pub use orm::OrmStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: Uuid },

    /// A delete refused because related rows still point at the target.
    #[error("{0}")]
    Guard(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Orm(#[from] sea_orm::DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Field label carried by [`StoreError::Duplicate`] for order numbers.
pub const ORDER_NUMBER_FIELD: &str = "order number";

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub order_date_gte: Option<DateTime<Utc>>,
    pub order_date_lte: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn for_customer(customer_id: Uuid) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        self.customer_id.is_none_or(|id| order.customer_id == id)
            && self.status.is_none_or(|status| order.status == status)
            && self.order_date_gte.is_none_or(|from| order.order_date >= from)
            && self.order_date_lte.is_none_or(|to| order.order_date <= to)
    }
}

#[async_trait]
pub trait CrmStore: Send + Sync {
    /// Short backend name, reported by the health check.
    fn backend(&self) -> &'static str;

    async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer>;
    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;
    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;
    /// Fails with [`StoreError::Guard`] while the customer owns any order.
    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_customers(&self) -> StoreResult<u64>;

    async fn insert_product(&self, product: Product) -> StoreResult<Product>;
    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    /// Returns the products that exist among `ids`, each at most once.
    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    /// Adds `amount` to every product whose stock is below `threshold`, in
    /// one atomic step, and returns the restocked products ordered by name.
    async fn restock_below(
        &self,
        threshold: i32,
        amount: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Product>>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;

    /// Stores the order together with its product links.
    async fn insert_order(&self, order: Order) -> StoreResult<Order>;
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>>;
    /// Matching orders, newest `created_at` first.
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;
    async fn update_order(&self, order: Order) -> StoreResult<Order>;
    /// Removes the order along with its product links and line items.
    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_orders(&self) -> StoreResult<u64>;
    async fn sum_order_totals(&self) -> StoreResult<Decimal>;

    async fn insert_order_item(&self, item: OrderItem) -> StoreResult<OrderItem>;
    async fn get_order_item(&self, id: Uuid) -> StoreResult<Option<OrderItem>>;
    async fn list_order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>>;
    async fn delete_order_item(&self, id: Uuid) -> StoreResult<bool>;
}
