//! SeaORM-backed store. Uniqueness and referential integrity come from the
//! schema in `migrations/`; violations are mapped back to [`StoreError`].

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use super::{CrmStore, ORDER_NUMBER_FIELD, OrderFilter, StoreError, StoreResult};
use crate::{
    db::OrmConn,
    entity::{
        customers::{ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers, Model as CustomerModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        order_products::{ActiveModel as OrderProductActive, Column as OrderProductCol, Entity as OrderProducts},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    models::{Customer, Order, OrderItem, OrderStatus, Product},
    rules::CUSTOMER_HAS_ORDERS,
};

#[derive(Clone)]
pub struct OrmStore {
    conn: OrmConn,
}

impl OrmStore {
    pub fn new(conn: OrmConn) -> Self {
        Self { conn }
    }

    async fn product_ids_for(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<Uuid>>> {
        let mut links: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(links);
        }
        let rows = OrderProducts::find()
            .filter(OrderProductCol::OrderId.is_in(order_ids.to_vec()))
            .all(&self.conn)
            .await?;
        for row in rows {
            links.entry(row.order_id).or_default().push(row.product_id);
        }
        Ok(links)
    }
}

fn map_write_err(unique_field: &'static str, entity: &'static str, id: Uuid) -> impl FnOnce(DbErr) -> StoreError {
    move |err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate {
            field: unique_field,
        },
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::Missing { entity, id },
        _ => match err {
            DbErr::RecordNotUpdated => StoreError::Missing { entity, id },
            other => StoreError::Orm(other),
        },
    }
}

#[async_trait]
impl CrmStore for OrmStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_customer(&self, customer: Customer) -> StoreResult<Customer> {
        let id = customer.id;
        let model = CustomerActive {
            id: Set(customer.id),
            first_name: Set(customer.first_name),
            last_name: Set(customer.last_name),
            email: Set(customer.email),
            phone_number: Set(customer.phone_number),
            created_at: Set(customer.created_at.into()),
            updated_at: Set(customer.updated_at.into()),
        }
        .insert(&self.conn)
        .await
        .map_err(map_write_err("email", "Customer", id))?;

        Ok(customer_from_entity(model))
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(Customers::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(customer_from_entity))
    }

    async fn find_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        Ok(Customers::find()
            .filter(CustomerCol::Email.eq(email))
            .one(&self.conn)
            .await?
            .map(customer_from_entity))
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        // orders.customer_id has no ON DELETE action, so an owned order blocks the delete.
        let result = Customers::delete_by_id(id)
            .exec(&self.conn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    StoreError::Guard(CUSTOMER_HAS_ORDERS.to_string())
                }
                _ => StoreError::Orm(err),
            })?;
        Ok(result.rows_affected > 0)
    }

    async fn count_customers(&self) -> StoreResult<u64> {
        Ok(Customers::find().count(&self.conn).await?)
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        let id = product.id;
        let model = ProductActive {
            id: Set(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            stock: Set(product.stock),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
        }
        .insert(&self.conn)
        .await
        .map_err(map_write_err("id", "Product", id))?;

        Ok(product_from_entity(model))
    }

    async fn get_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(product_from_entity))
    }

    async fn get_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Products::find()
            .filter(ProdCol::Id.is_in(unique))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect())
    }

    async fn restock_below(
        &self,
        threshold: i32,
        amount: i32,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Product>> {
        let mut restocked: Vec<Product> = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(amount))
            .col_expr(ProdCol::UpdatedAt, Expr::value(now.fixed_offset()))
            .filter(ProdCol::Stock.lt(threshold))
            .exec_with_returning(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();
        restocked.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(restocked)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn insert_order(&self, order: Order) -> StoreResult<Order> {
        let txn = self.conn.begin().await?;
        let customer_id = order.customer_id;

        let model = OrderActive {
            id: Set(order.id),
            customer_id: Set(order.customer_id),
            order_number: Set(order.order_number),
            status: Set(order.status.as_str().to_string()),
            total_amount: Set(order.total_amount),
            order_date: Set(order.order_date.into()),
            created_at: Set(order.created_at.into()),
            updated_at: Set(order.updated_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_write_err(ORDER_NUMBER_FIELD, "Customer", customer_id))?;

        if !order.product_ids.is_empty() {
            let links = order.product_ids.iter().map(|product_id| OrderProductActive {
                order_id: Set(model.id),
                product_id: Set(*product_id),
            });
            OrderProducts::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        order_from_entity(model, order.product_ids)
    }

    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let Some(model) = Orders::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let mut links = self.product_ids_for(&[id]).await?;
        order_from_entity(model, links.remove(&id).unwrap_or_default()).map(Some)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let mut condition = Condition::all();
        if let Some(customer_id) = filter.customer_id {
            condition = condition.add(OrderCol::CustomerId.eq(customer_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(OrderCol::Status.eq(status.as_str()));
        }
        if let Some(from) = filter.order_date_gte {
            condition = condition.add(OrderCol::OrderDate.gte(from));
        }
        if let Some(to) = filter.order_date_lte {
            condition = condition.add(OrderCol::OrderDate.lte(to));
        }

        let models = Orders::find()
            .filter(condition)
            .order_by_desc(OrderCol::CreatedAt)
            .all(&self.conn)
            .await?;

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut links = self.product_ids_for(&ids).await?;

        models
            .into_iter()
            .map(|model| {
                let product_ids = links.remove(&model.id).unwrap_or_default();
                order_from_entity(model, product_ids)
            })
            .collect()
    }

    async fn update_order(&self, order: Order) -> StoreResult<Order> {
        let id = order.id;
        // order_number is left untouched: it cannot change after insert.
        let model = OrderActive {
            id: Set(order.id),
            customer_id: Set(order.customer_id),
            order_number: NotSet,
            status: Set(order.status.as_str().to_string()),
            total_amount: Set(order.total_amount),
            order_date: Set(order.order_date.into()),
            created_at: NotSet,
            updated_at: Set(order.updated_at.into()),
        }
        .update(&self.conn)
        .await
        .map_err(map_write_err(ORDER_NUMBER_FIELD, "Order", id))?;

        order_from_entity(model, order.product_ids)
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let result = Orders::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn count_orders(&self) -> StoreResult<u64> {
        Ok(Orders::find().count(&self.conn).await?)
    }

    async fn sum_order_totals(&self) -> StoreResult<Decimal> {
        let total = Orders::find()
            .select_only()
            .column_as(OrderCol::TotalAmount.sum(), "total")
            .into_tuple::<Option<Decimal>>()
            .one(&self.conn)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn insert_order_item(&self, item: OrderItem) -> StoreResult<OrderItem> {
        let order_id = item.order_id;
        let model = OrderItemActive {
            id: Set(item.id),
            order_id: Set(item.order_id),
            product_name: Set(item.product_name),
            quantity: Set(item.quantity),
            price: Set(item.price),
            created_at: Set(item.created_at.into()),
            updated_at: Set(item.updated_at.into()),
        }
        .insert(&self.conn)
        .await
        .map_err(map_write_err("id", "Order", order_id))?;

        Ok(order_item_from_entity(model))
    }

    async fn get_order_item(&self, id: Uuid) -> StoreResult<Option<OrderItem>> {
        Ok(OrderItems::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(order_item_from_entity))
    }

    async fn list_order_items(&self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
        Ok(OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order_id))
            .order_by_desc(OrderItemCol::CreatedAt)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect())
    }

    async fn delete_order_item(&self, id: Uuid) -> StoreResult<bool> {
        let result = OrderItems::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

fn customer_from_entity(model: CustomerModel) -> Customer {
    Customer {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone_number: model.phone_number,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel, product_ids: Vec<Uuid>) -> StoreResult<Order> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(StoreError::Backend)?;
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        order_number: model.order_number,
        status,
        total_amount: model.total_amount,
        order_date: model.order_date.with_timezone(&Utc),
        product_ids,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_name: model.product_name,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
