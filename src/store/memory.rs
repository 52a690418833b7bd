//! In-memory store, used by tests and by the server when no database is configured.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{CrmStore, ORDER_NUMBER_FIELD, OrderFilter, StoreError, StoreResult};
use crate::{
    models::{Customer, Order, OrderItem, Product},
    rules::DeleteGuard,
};

#[derive(Default)]
struct Tables {
    customers: HashMap<Uuid, Customer>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
    order_items: HashMap<Uuid, OrderItem>,
}

/// Every operation takes a single lock over all tables, so uniqueness checks
/// and multi-row writes are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire read lock: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Backend(format!("Failed to acquire write lock: {e}")))
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer> {
        let mut tables = self.write()?;
        if tables.customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        tables.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        Ok(self
            .read()?
            .customers
            .values()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write()?;
        let Some(customer) = tables.customers.get(&id) else {
            return Ok(false);
        };
        let owned: Vec<Order> = tables
            .orders
            .values()
            .filter(|o| o.customer_id == id)
            .cloned()
            .collect();
        customer
            .validate_for_delete(&owned)
            .map_err(|violation| StoreError::Guard(violation.to_string()))?;

        tables.customers.remove(&id);
        Ok(true)
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        Ok(self.read()?.customers.len() as u64)
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        self.write()?.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let tables = self.read()?;
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn restock_below(
        &self,
        threshold: i32,
        amount: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Product>> {
        let mut tables = self.write()?;
        let mut restocked = Vec::new();
        for product in tables.products.values_mut().filter(|p| p.stock < threshold) {
            product.stock += amount;
            product.touch(now);
            restocked.push(product.clone());
        }
        restocked.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(restocked)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        for order in tables.orders.values_mut() {
            order.product_ids.retain(|product_id| *product_id != id);
        }
        Ok(true)
    }

    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let mut tables = self.write()?;
        if tables.orders.values().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Duplicate {
                field: ORDER_NUMBER_FIELD,
            });
        }
        if !tables.customers.contains_key(&order.customer_id) {
            return Err(StoreError::Missing {
                entity: "Customer",
                id: order.customer_id,
            });
        }
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()?
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, mut order: Order) -> StoreResult<Order> {
        let mut tables = self.write()?;
        let stored = tables.orders.get(&order.id).ok_or(StoreError::Missing {
            entity: "Order",
            id: order.id,
        })?;
        order.created_at = stored.created_at;
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.orders.remove(&id).is_none() {
            return Ok(false);
        }
        tables.order_items.retain(|_, item| item.order_id != id);
        Ok(true)
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        Ok(self.read()?.orders.len() as u64)
    }

    async fn sum_order_totals(&self) -> StoreResult<Decimal> {
        Ok(self
            .read()?
            .orders
            .values()
            .map(|o| o.total_amount)
            .sum())
    }

    async fn insert_order_item(&self, item: OrderItem) -> StoreResult<OrderItem> {
        let mut tables = self.write()?;
        if !tables.orders.contains_key(&item.order_id) {
            return Err(StoreError::Missing {
                entity: "Order",
                id: item.order_id,
            });
        }
        tables.order_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_order_item(&self, id: Uuid) -> StoreResult<Option<OrderItem>> {
        Ok(self.read()?.order_items.get(&id).cloned())
    }

    async fn list_order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
        let mut items: Vec<OrderItem> = self
            .read()?
            .order_items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn delete_order_item(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.write()?.order_items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_store() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_customer(Customer::new("A", "B", "dup@example.com", None, now))
            .await
            .unwrap();

        let err = store
            .insert_customer(Customer::new("C", "D", "dup@example.com", None, now))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "email" }));
        assert_eq!(store.count_customers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_products_collapses_repeated_ids() {
        let store = MemoryStore::new();
        let product = store
            .insert_product(Product::new("Mug", None, dec!(4), 1, Utc::now()))
            .await
            .unwrap();

        let found = store
            .get_products(&[product.id, product.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn restock_adds_to_the_stored_stock() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let low = store
            .insert_product(Product::new("Mug", None, dec!(4), 3, now))
            .await
            .unwrap();
        let plenty = store
            .insert_product(Product::new("Bowl", None, dec!(4), 10, now))
            .await
            .unwrap();

        let restocked = store.restock_below(10, 10, now).await.unwrap();
        assert_eq!(restocked.len(), 1);
        assert_eq!(restocked[0].stock, 13);
        assert_eq!(store.get_product(low.id).await.unwrap().unwrap().stock, 13);
        assert_eq!(store.get_product(plenty.id).await.unwrap().unwrap().stock, 10);

        assert!(store.restock_below(10, 10, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn customer_with_orders_is_kept() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let customer = store
            .insert_customer(Customer::new("A", "B", "owner@example.com", None, now))
            .await
            .unwrap();
        let order = store
            .insert_order(Order::new(customer.id, "ORD-1", vec![], dec!(1), now, now))
            .await
            .unwrap();

        let err = store.delete_customer(customer.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Guard(_)));
        assert!(store.get_customer(customer.id).await.unwrap().is_some());

        store.delete_order(order.id).await.unwrap();
        assert!(store.delete_customer(customer.id).await.unwrap());
        assert!(!store.delete_customer(customer.id).await.unwrap());
    }
}
