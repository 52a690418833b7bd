use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_backend::{
    dto::{
        customers::{BulkCreateCustomersInput, CreateCustomerInput},
        orders::{CreateOrderInput, CreateOrderItemRequest, OrdersQuery, UpdateOrderStatusRequest},
        products::CreateProductInput,
    },
    error::AppError,
    models::{Customer, Order, OrderItem, OrderStatus, Product},
    services::{customer_service, order_service, product_service, report_service},
    state::AppState,
    store::{CrmStore, MemoryStore, ORDER_NUMBER_FIELD, OrderFilter, StoreError, StoreResult},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Memory store that stalls before the reads a handler makes ahead of its
/// write, so concurrent handlers interleave at the worst point. It can also
/// report the next few order numbers as taken.
#[derive(Default)]
struct SlowStore {
    inner: MemoryStore,
    taken_order_numbers: AtomicU32,
}

impl SlowStore {
    const DELAY: Duration = Duration::from_millis(20);

    fn with_taken_order_numbers(count: u32) -> Self {
        Self {
            taken_order_numbers: AtomicU32::new(count),
            ..Self::default()
        }
    }

    async fn stall(&self) {
        tokio::time::sleep(Self::DELAY).await;
    }
}

#[async_trait]
impl CrmStore for SlowStore {
    fn backend(&self) -> &'static str {
        "slow-memory"
    }

    async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer> {
        self.inner.insert_customer(customer).await
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        self.inner.get_customer(id).await
    }

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let found = self.inner.find_customer_by_email(email).await;
        self.stall().await;
        found
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_customer(id).await
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        self.inner.count_customers().await
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        self.inner.insert_product(product).await
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        self.inner.get_product(id).await
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        self.inner.get_products(ids).await
    }

    async fn restock_below(
        &self,
        threshold: i32,
        amount: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Product>> {
        self.stall().await;
        self.inner.restock_below(threshold, amount, now).await
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_product(id).await
    }

    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let taken = self
            .taken_order_numbers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if taken {
            return Err(StoreError::Duplicate {
                field: ORDER_NUMBER_FIELD,
            });
        }
        self.inner.insert_order(order).await
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        self.inner.get_order(id).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let orders = self.inner.list_orders(filter).await;
        self.stall().await;
        orders
    }

    async fn update_order(&self, order: Order) -> StoreResult<Order> {
        self.inner.update_order(order).await
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_order(id).await
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        self.inner.count_orders().await
    }

    async fn sum_order_totals(&self) -> StoreResult<Decimal> {
        self.inner.sum_order_totals().await
    }

    async fn insert_order_item(&self, item: OrderItem) -> StoreResult<OrderItem> {
        self.inner.insert_order_item(item).await
    }

    async fn get_order_item(&self, id: Uuid) -> StoreResult<Option<OrderItem>> {
        self.inner.get_order_item(id).await
    }

    async fn list_order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
        self.inner.list_order_items(order_id).await
    }

    async fn delete_order_item(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_order_item(id).await
    }
}

fn slow_state(store: SlowStore) -> AppState {
    AppState::new(Arc::new(store))
}

fn customer_input(name: &str, email: &str, phone: Option<&str>) -> CreateCustomerInput {
    CreateCustomerInput {
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
    }
}

async fn seed_customer(state: &AppState, email: &str) -> Customer {
    customer_service::create_customer(state, customer_input("Ada Lovelace", email, None))
        .await
        .expect("create customer")
        .data
        .expect("payload")
        .customer
}

async fn seed_product(state: &AppState, name: &str, price: Decimal, stock: i32) -> Product {
    product_service::create_product(
        state,
        CreateProductInput {
            name: name.to_string(),
            description: None,
            price,
            stock,
        },
    )
    .await
    .expect("create product")
    .data
    .expect("payload")
    .product
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let state = AppState::in_memory();
    seed_customer(&state, "ada@example.com").await;

    let err = customer_service::create_customer(
        &state,
        customer_input("Ada Byron", "ada@example.com", None),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Email already exists."));
    assert_eq!(report_service::total_customers(&state).await.unwrap(), 1);
}

#[tokio::test]
async fn create_customer_validates_phone_and_email() {
    let state = AppState::in_memory();

    let err = customer_service::create_customer(
        &state,
        customer_input("Ada Lovelace", "ada@example.com", Some("12345")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid phone format.");

    let err = customer_service::create_customer(
        &state,
        customer_input("Ada Lovelace", "not-an-email", None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let created = customer_service::create_customer(
        &state,
        customer_input("Ada Lovelace", "ada@example.com", Some("+12345678901")),
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(created.message, "Customer created successfully.");
    assert_eq!(created.customer.first_name, "Ada");
    assert_eq!(created.customer.last_name, "Lovelace");
    assert_eq!(created.customer.phone_number.as_deref(), Some("+12345678901"));
}

#[tokio::test]
async fn bulk_create_reports_failures_per_entry() {
    let state = AppState::in_memory();

    let payload = customer_service::bulk_create_customers(
        &state,
        BulkCreateCustomersInput {
            input: vec![
                customer_input("Grace Hopper", "grace@example.com", Some("123-456-7890")),
                customer_input("Alan Turing", "alan@example.com", Some("12-34")),
                customer_input("Grace Again", "grace@example.com", None),
            ],
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();

    assert_eq!(payload.customers.len(), 1);
    assert_eq!(payload.customers[0].email, "grace@example.com");
    assert_eq!(
        payload.errors,
        vec![
            "Entry 1: Invalid phone format.".to_string(),
            "Entry 2: Email already exists.".to_string(),
        ]
    );
}

#[tokio::test]
async fn create_order_sums_distinct_product_prices() {
    let state = AppState::in_memory();
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(10.00), 3).await;
    let pad = seed_product(&state, "Pad", dec!(5.50), 3).await;

    let order = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id, pad.id, pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap()
    .order;

    assert_eq!(order.total_amount, dec!(15.50));
    assert_eq!(order.product_ids.len(), 2);
    assert_eq!(order.status, OrderStatus::Active);
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(report_service::total_revenue(&state).await.unwrap(), dec!(15.50));
}

#[tokio::test]
async fn create_order_rejects_bad_references() {
    let state = AppState::in_memory();
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(10.00), 3).await;

    let empty = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![],
            order_date: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(empty, AppError::InvalidInput(_)));

    let unknown_customer = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: Uuid::new_v4(),
            product_ids: vec![pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown_customer, AppError::NotFound(ref msg) if msg == "Invalid customer ID."));

    let unknown_product = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id, Uuid::new_v4()],
            order_date: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(unknown_product.to_string(), "One or more product IDs are invalid.");

    assert_eq!(report_service::total_orders(&state).await.unwrap(), 0);
}

#[tokio::test]
async fn customer_with_orders_cannot_be_deleted() {
    let state = AppState::in_memory();
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(10.00), 3).await;
    order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap();

    let err = customer_service::delete_customer(&state, customer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GuardViolation(ref msg)
        if msg == "Cannot delete customer with existing orders."));

    let lonely = seed_customer(&state, "grace@example.com").await;
    customer_service::delete_customer(&state, lonely.id).await.unwrap();
    assert_eq!(report_service::total_customers(&state).await.unwrap(), 1);
}

#[tokio::test]
async fn product_with_stock_cannot_be_deleted() {
    let state = AppState::in_memory();
    let stocked = seed_product(&state, "Pen", dec!(10.00), 4).await;
    let empty = seed_product(&state, "Pad", dec!(2.00), 0).await;

    let err = product_service::delete_product(&state, stocked.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete product with stock available.");

    product_service::delete_product(&state, empty.id).await.unwrap();
    let err = product_service::get_product(&state, empty.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn create_product_requires_positive_price() {
    let state = AppState::in_memory();

    let err = product_service::create_product(
        &state,
        CreateProductInput {
            name: "Freebie".into(),
            description: None,
            price: Decimal::ZERO,
            stock: 1,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Price must be a positive number.");

    let err = product_service::create_product(
        &state,
        CreateProductInput {
            name: "Widget".into(),
            description: None,
            price: dec!(1.00),
            stock: -1,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Stock cannot be negative.");
}

#[tokio::test]
async fn restock_tops_up_low_stock_products_once() {
    let state = AppState::in_memory();
    let a = seed_product(&state, "A", dec!(1.00), 5).await;
    let b = seed_product(&state, "B", dec!(1.00), 12).await;

    let first = product_service::update_low_stock_products(&state)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(first.message, "1 product(s) restocked.");
    assert_eq!(first.updated_products.len(), 1);
    assert_eq!(first.updated_products[0].id, a.id);
    assert_eq!(first.updated_products[0].stock, 15);

    let b_after = product_service::get_product(&state, b.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(b_after.product.stock, 12);

    let second = product_service::update_low_stock_products(&state)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(second.message, "0 product(s) restocked.");
    assert!(second.updated_products.is_empty());
}

#[tokio::test]
async fn order_lifecycle_guards() {
    let state = AppState::in_memory();
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(10.00), 3).await;
    let order = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap()
    .order;

    let item = order_service::create_order_item(
        &state,
        order.id,
        CreateOrderItemRequest {
            product_name: "Pen".into(),
            quantity: 2,
            price: dec!(10.00),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(item.total_price, dec!(20.00));

    let err = order_service::create_order_item(
        &state,
        order.id,
        CreateOrderItemRequest {
            product_name: "Pen".into(),
            quantity: 0,
            price: dec!(10.00),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Quantity must be greater than zero.");

    let err = order_service::delete_order(&state, order.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete an active order.");

    let err = order_service::update_order_status(
        &state,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let updated = order_service::update_order_status(
        &state,
        order.id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(updated.status, OrderStatus::Completed);
    assert_eq!(updated.order_number, order.order_number);

    let err = order_service::delete_order_item(&state, item.item.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GuardViolation(ref msg)
        if msg == "Cannot delete items from a completed order."));

    order_service::delete_order(&state, order.id).await.unwrap();
    assert_eq!(report_service::total_orders(&state).await.unwrap(), 0);
}

#[tokio::test]
async fn orders_query_filters_by_date_and_carries_customer() {
    let state = AppState::in_memory();
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(10.00), 3).await;
    let now = chrono::Utc::now();

    for days_ago in [1, 30] {
        order_service::create_order(
            &state,
            CreateOrderInput {
                customer_id: customer.id,
                product_ids: vec![pen.id],
                order_date: Some(now - chrono::Duration::days(days_ago)),
            },
        )
        .await
        .unwrap();
    }

    let recent = order_service::list_orders(
        &state,
        OrdersQuery {
            order_date_gte: Some(now - chrono::Duration::days(7)),
            order_date_lte: Some(now),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].customer.email, "ada@example.com");
    assert_eq!(recent[0].customer.full_name, "Ada Lovelace");

    let all = order_service::list_orders(&state, OrdersQuery::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn totals_start_at_zero() {
    let state = AppState::in_memory();
    assert_eq!(report_service::total_customers(&state).await.unwrap(), 0);
    assert_eq!(report_service::total_orders(&state).await.unwrap(), 0);
    assert_eq!(report_service::total_revenue(&state).await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn delete_customer_racing_a_new_order_keeps_the_order_owned() {
    let state = slow_state(SlowStore::default());
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(2.00), 1).await;

    // The delete reads the (empty) order list, stalls, and the order lands meanwhile.
    let (deleted, created) = tokio::join!(
        customer_service::delete_customer(&state, customer.id),
        order_service::create_order(
            &state,
            CreateOrderInput {
                customer_id: customer.id,
                product_ids: vec![pen.id],
                order_date: None,
            },
        ),
    );
    assert!(created.is_ok(), "{created:?}");
    assert!(
        matches!(deleted, Err(AppError::GuardViolation(ref m)) if m == "Cannot delete customer with existing orders."),
        "{deleted:?}"
    );
    assert!(
        customer_service::get_customer(&state, customer.id)
            .await
            .is_ok()
    );

    let listed = order_service::list_orders(&state, OrdersQuery::default())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn concurrent_restock_sweeps_apply_each_increment_once() {
    let state = slow_state(SlowStore::default());
    let mug = seed_product(&state, "Mug", dec!(3.00), 5).await;

    let (first, second) = tokio::join!(
        product_service::update_low_stock_products(&state),
        product_service::update_low_stock_products(&state),
    );
    let mut reported: Vec<usize> = [first, second]
        .into_iter()
        .map(|sweep| sweep.unwrap().data.unwrap().updated_products.len())
        .collect();
    reported.sort_unstable();
    assert_eq!(reported, vec![0, 1]);

    let stored = product_service::get_product(&state, mug.id)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(stored.product.stock, 15);
}

#[tokio::test]
async fn racing_signups_with_one_email_create_one_customer() {
    let state = slow_state(SlowStore::default());

    // Both calls pass the pre-insert lookup before either writes.
    let (first, second) = tokio::join!(
        customer_service::create_customer(&state, customer_input("Ada Lovelace", "ada@example.com", None)),
        customer_service::create_customer(&state, customer_input("Ada Byron", "ada@example.com", None)),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(
        |r| matches!(r, Err(AppError::Conflict(m)) if m == "Email already exists.")
    ));
    assert_eq!(report_service::total_customers(&state).await.unwrap(), 1);
}

#[tokio::test]
async fn taken_order_number_is_regenerated() {
    let state = slow_state(SlowStore::with_taken_order_numbers(2));
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(2.00), 1).await;

    let order = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap()
    .order;
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(report_service::total_orders(&state).await.unwrap(), 1);
}

#[tokio::test]
async fn order_number_conflict_surfaces_after_bounded_attempts() {
    let state = slow_state(SlowStore::with_taken_order_numbers(u32::MAX));
    let customer = seed_customer(&state, "ada@example.com").await;
    let pen = seed_product(&state, "Pen", dec!(2.00), 1).await;

    let err = order_service::create_order(
        &state,
        CreateOrderInput {
            customer_id: customer.id,
            product_ids: vec![pen.id],
            order_date: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref m) if m == "Order number already exists."));
    assert_eq!(report_service::total_orders(&state).await.unwrap(), 0);
}
