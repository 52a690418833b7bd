//! Named operations shared by `POST /api/execute` and the job runner.
//!
//! A call is an operation name plus a JSON object of camelCase variables.
//! The result is the operation's payload; failures keep their `AppError`
//! kind so callers can tell invalid input from conflicts and guard
//! violations.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{
        customers::{BulkCreateCustomersInput, CreateCustomerInput},
        orders::{CreateOrderInput, CreateOrderItemRequest, OrdersQuery, UpdateOrderStatusRequest},
        products::CreateProductInput,
        reports::HelloInput,
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    services::{customer_service, order_service, product_service, report_service},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Hello,
    TotalCustomers,
    TotalOrders,
    TotalRevenue,
    Orders,
    Customer,
    Product,
    Order,
    CreateCustomer,
    BulkCreateCustomers,
    CreateProduct,
    CreateOrder,
    UpdateLowStockProducts,
    UpdateOrderStatus,
    CreateOrderItem,
    DeleteCustomer,
    DeleteProduct,
    DeleteOrder,
    DeleteOrderItem,
}

impl Operation {
    pub const ALL: [Operation; 19] = [
        Operation::Hello,
        Operation::TotalCustomers,
        Operation::TotalOrders,
        Operation::TotalRevenue,
        Operation::Orders,
        Operation::Customer,
        Operation::Product,
        Operation::Order,
        Operation::CreateCustomer,
        Operation::BulkCreateCustomers,
        Operation::CreateProduct,
        Operation::CreateOrder,
        Operation::UpdateLowStockProducts,
        Operation::UpdateOrderStatus,
        Operation::CreateOrderItem,
        Operation::DeleteCustomer,
        Operation::DeleteProduct,
        Operation::DeleteOrder,
        Operation::DeleteOrderItem,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Hello => "hello",
            Operation::TotalCustomers => "totalCustomers",
            Operation::TotalOrders => "totalOrders",
            Operation::TotalRevenue => "totalRevenue",
            Operation::Orders => "orders",
            Operation::Customer => "customer",
            Operation::Product => "product",
            Operation::Order => "order",
            Operation::CreateCustomer => "createCustomer",
            Operation::BulkCreateCustomers => "bulkCreateCustomers",
            Operation::CreateProduct => "createProduct",
            Operation::CreateOrder => "createOrder",
            Operation::UpdateLowStockProducts => "updateLowStockProducts",
            Operation::UpdateOrderStatus => "updateOrderStatus",
            Operation::CreateOrderItem => "createOrderItem",
            Operation::DeleteCustomer => "deleteCustomer",
            Operation::DeleteProduct => "deleteProduct",
            Operation::DeleteOrder => "deleteOrder",
            Operation::DeleteOrderItem => "deleteOrderItem",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| format!("Unknown operation: {name}"))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub variables: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OperationError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OperationResponse {
    #[schema(value_type = Object)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<OperationError>,
}

impl OperationResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn failed(err: &AppError) -> Self {
        Self {
            data: None,
            errors: vec![OperationError {
                code: err.code().to_string(),
                message: err.to_string(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdVariables {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct UpdateOrderStatusVariables {
    id: Uuid,
    #[serde(flatten)]
    request: UpdateOrderStatusRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderItemVariables {
    order_id: Uuid,
    #[serde(flatten)]
    item: CreateOrderItemRequest,
}

pub async fn execute(state: &AppState, operation: &str, variables: Value) -> AppResult<Value> {
    let operation: Operation = operation.parse().map_err(AppError::InvalidInput)?;
    tracing::debug!(%operation, "executing operation");

    match operation {
        Operation::Hello => to_value(report_service::hello(vars::<HelloInput>(variables)?)),
        Operation::TotalCustomers => to_value(report_service::total_customers(state).await?),
        Operation::TotalOrders => to_value(report_service::total_orders(state).await?),
        Operation::TotalRevenue => to_value(report_service::total_revenue(state).await?),
        Operation::Orders => {
            let query: OrdersQuery = vars(variables)?;
            payload(order_service::list_orders(state, query).await?)
        }
        Operation::Customer => {
            let IdVariables { id } = vars(variables)?;
            payload(customer_service::get_customer(state, id).await?)
        }
        Operation::Product => {
            let IdVariables { id } = vars(variables)?;
            payload(product_service::get_product(state, id).await?)
        }
        Operation::Order => {
            let IdVariables { id } = vars(variables)?;
            payload(order_service::get_order(state, id).await?)
        }
        Operation::CreateCustomer => {
            let input: CreateCustomerInput = vars(variables)?;
            payload(customer_service::create_customer(state, input).await?)
        }
        Operation::BulkCreateCustomers => {
            let input: BulkCreateCustomersInput = vars(variables)?;
            payload(customer_service::bulk_create_customers(state, input).await?)
        }
        Operation::CreateProduct => {
            let input: CreateProductInput = vars(variables)?;
            payload(product_service::create_product(state, input).await?)
        }
        Operation::CreateOrder => {
            let input: CreateOrderInput = vars(variables)?;
            payload(order_service::create_order(state, input).await?)
        }
        Operation::UpdateLowStockProducts => {
            payload(product_service::update_low_stock_products(state).await?)
        }
        Operation::UpdateOrderStatus => {
            let UpdateOrderStatusVariables { id, request } = vars(variables)?;
            payload(order_service::update_order_status(state, id, request).await?)
        }
        Operation::CreateOrderItem => {
            let CreateOrderItemVariables { order_id, item } = vars(variables)?;
            payload(order_service::create_order_item(state, order_id, item).await?)
        }
        Operation::DeleteCustomer => {
            let IdVariables { id } = vars(variables)?;
            payload(customer_service::delete_customer(state, id).await?)
        }
        Operation::DeleteProduct => {
            let IdVariables { id } = vars(variables)?;
            payload(product_service::delete_product(state, id).await?)
        }
        Operation::DeleteOrder => {
            let IdVariables { id } = vars(variables)?;
            payload(order_service::delete_order(state, id).await?)
        }
        Operation::DeleteOrderItem => {
            let IdVariables { id } = vars(variables)?;
            payload(order_service::delete_order_item(state, id).await?)
        }
    }
}

fn vars<T: DeserializeOwned>(variables: Value) -> AppResult<T> {
    let variables = match variables {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(variables)
        .map_err(|e| AppError::InvalidInput(format!("Invalid variables: {e}")))
}

fn to_value<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn payload<T: Serialize>(response: ApiResponse<T>) -> AppResult<Value> {
    to_value(response.into_data())
}
