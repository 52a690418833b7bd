use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ContactInfo, Customer, Order};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerInput {
    /// Full name; the first word becomes the first name.
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    pub customer: Customer,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkCreateCustomersInput {
    pub input: Vec<CreateCustomerInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateCustomersPayload {
    pub customers: Vec<Customer>,
    pub errors: Vec<String>,
}

/// A customer with its derived properties, evaluated at request time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: Customer,
    pub full_name: String,
    pub contact_info: ContactInfo,
    pub is_active: bool,
    pub order_count: usize,
    pub last_order_date: Option<DateTime<Utc>>,
    pub recent_orders: Vec<Order>,
    pub has_orders: bool,
    pub is_new_customer: bool,
}

impl CustomerDetail {
    pub fn evaluate(customer: Customer, orders: &[Order], now: DateTime<Utc>) -> Self {
        Self {
            full_name: customer.full_name(),
            contact_info: customer.contact_info(),
            is_active: customer.is_active(orders),
            order_count: customer.order_count(orders),
            last_order_date: customer.last_order_date(orders),
            recent_orders: customer.recent_orders(orders).into_iter().cloned().collect(),
            has_orders: customer.has_orders(orders),
            is_new_customer: customer.is_new_customer(now),
            customer,
        }
    }
}
