use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        customers::{
            BulkCreateCustomersInput, BulkCreateCustomersPayload, CreateCustomerInput,
            CreateCustomerPayload, CustomerDetail,
        },
        orders::{
            CreateOrderInput, CreateOrderItemRequest, CreateOrderPayload, OrderCustomer,
            OrderDetail, OrderItemDetail, OrderWithCustomer, OrdersQuery,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductInput, CreateProductPayload, ProductDetail, RestockPayload},
        reports::ReportSummary,
    },
    models::{ContactInfo, Customer, Order, OrderItem, OrderStatus, Product},
    operations::{OperationError, OperationRequest, OperationResponse},
    response::{ApiResponse, Meta},
    routes::{customers, health, operations, orders, products, reports},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        operations::execute,
        customers::create_customer,
        customers::bulk_create_customers,
        customers::get_customer,
        customers::delete_customer,
        products::create_product,
        products::restock_low_stock,
        products::get_product,
        products::delete_product,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
        orders::create_order_item,
        orders::delete_order_item,
        reports::summary
    ),
    components(
        schemas(
            Customer,
            ContactInfo,
            Product,
            Order,
            OrderStatus,
            OrderItem,
            OperationRequest,
            OperationResponse,
            OperationError,
            CreateCustomerInput,
            CreateCustomerPayload,
            BulkCreateCustomersInput,
            BulkCreateCustomersPayload,
            CustomerDetail,
            CreateProductInput,
            CreateProductPayload,
            RestockPayload,
            ProductDetail,
            CreateOrderInput,
            CreateOrderPayload,
            OrdersQuery,
            OrderCustomer,
            OrderWithCustomer,
            UpdateOrderStatusRequest,
            CreateOrderItemRequest,
            OrderItemDetail,
            OrderDetail,
            ReportSummary,
            health::HealthData,
            Meta,
            ApiResponse<CustomerDetail>,
            ApiResponse<ProductDetail>,
            ApiResponse<OrderDetail>,
            ApiResponse<ReportSummary>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Operations", description = "Named operation endpoint used by scheduled jobs"),
        (name = "Customers", description = "Customer endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order and order item endpoints"),
        (name = "Reports", description = "Aggregate report endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
