use std::{path::Path, time::Duration};

use async_trait::async_trait;
use regex::Regex;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

use crm_backend::{
    dto::{customers::CreateCustomerInput, orders::CreateOrderInput, products::CreateProductInput},
    jobs::{
        ApiClient, ClientError, HttpApiClient, JobStatus, LogSink, heartbeat, low_stock,
        order_reminders, report,
    },
    operations::{self, OperationResponse},
    services::{customer_service, order_service, product_service},
    state::AppState,
};

/// Runs operations directly against a store, no HTTP involved.
struct InProcessClient {
    state: AppState,
}

#[async_trait]
impl ApiClient for InProcessClient {
    async fn execute(&self, operation: &str, variables: Value) -> Result<Value, ClientError> {
        operations::execute(&self.state, operation, variables)
            .await
            .map_err(|err| ClientError::Api(OperationResponse::failed(&err).errors))
    }
}

struct UnreachableClient;

#[async_trait]
impl ApiClient for UnreachableClient {
    async fn execute(&self, _operation: &str, _variables: Value) -> Result<Value, ClientError> {
        Err(ClientError::Status {
            status: 503,
            body: "service unavailable".into(),
        })
    }
}

fn sink(dir: &TempDir, name: &str) -> LogSink {
    LogSink::new(dir.path().join(name))
}

async fn read(path: &Path) -> String {
    tokio::fs::read_to_string(path).await.unwrap_or_default()
}

async fn seed_product(state: &AppState, name: &str, stock: i32) {
    product_service::create_product(
        state,
        CreateProductInput {
            name: name.into(),
            description: None,
            price: dec!(1.00),
            stock,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn heartbeat_logs_one_line_whatever_the_api_says() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "heartbeat.txt");
    let line = Regex::new(r"^\d{2}/\d{2}/\d{4}-\d{2}:\d{2}:\d{2} CRM is alive$").unwrap();

    let status = heartbeat::run(&UnreachableClient, &sink).await.unwrap();
    assert_eq!(status, JobStatus::Failed);
    assert_eq!(status.exit_code(), 1);

    let client = InProcessClient {
        state: AppState::in_memory(),
    };
    let status = heartbeat::run(&client, &sink).await.unwrap();
    assert_eq!(status, JobStatus::Success);

    let content = read(sink.path()).await;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| line.is_match(l)), "{content}");
}

#[tokio::test]
async fn low_stock_job_logs_restocked_products() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "low_stock.txt");
    let state = AppState::in_memory();
    seed_product(&state, "A", 5).await;
    seed_product(&state, "B", 12).await;
    let client = InProcessClient { state };

    assert_eq!(low_stock::run(&client, &sink).await.unwrap(), JobStatus::Success);
    assert_eq!(low_stock::run(&client, &sink).await.unwrap(), JobStatus::Success);

    let content = read(sink.path()).await;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3, "{content}");
    assert!(lines[0].ends_with(" - 1 product(s) restocked."));
    assert_eq!(lines[1], " - A updated to stock: 15");
    assert!(lines[2].ends_with(" - 0 product(s) restocked."));
}

#[tokio::test]
async fn low_stock_job_logs_exceptions_and_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "low_stock.txt");

    let status = low_stock::run(&UnreachableClient, &sink).await.unwrap();
    assert_eq!(status, JobStatus::Success);

    let content = read(sink.path()).await;
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains(" - Exception occurred: unexpected status 503"));
}

#[tokio::test]
async fn order_reminders_cover_the_last_week() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "reminders.txt");
    let state = AppState::in_memory();

    let customer = customer_service::create_customer(
        &state,
        CreateCustomerInput {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap()
    .customer;
    let product = product_service::create_product(
        &state,
        CreateProductInput {
            name: "Pen".into(),
            description: None,
            price: dec!(2.00),
            stock: 1,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap()
    .product;

    let now = chrono::Utc::now();
    let mut recent_id = None;
    for days_ago in [2, 20] {
        let order = order_service::create_order(
            &state,
            CreateOrderInput {
                customer_id: customer.id,
                product_ids: vec![product.id],
                order_date: Some(now - chrono::Duration::days(days_ago)),
            },
        )
        .await
        .unwrap()
        .data
        .unwrap()
        .order;
        if days_ago == 2 {
            recent_id = Some(order.id);
        }
    }

    let status = order_reminders::run(&InProcessClient { state }, &sink)
        .await
        .unwrap();
    assert_eq!(status, JobStatus::Success);

    let content = read(sink.path()).await;
    let expected = Regex::new(&format!(
        r"^\[\d{{4}}-\d{{2}}-\d{{2}} \d{{2}}:\d{{2}}:\d{{2}}\] Order ID: {}, Email: ada@example\.com$",
        recent_id.unwrap()
    ))
    .unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "{content}");
    assert!(expected.is_match(lines[0]), "{content}");
}

#[tokio::test]
async fn order_reminders_fail_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "reminders.txt");

    let status = order_reminders::run(&UnreachableClient, &sink).await.unwrap();
    assert_eq!(status, JobStatus::Failed);
    assert!(!sink.path().exists());
}

#[tokio::test]
async fn report_job_writes_totals_or_the_error() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir, "report.txt");
    let state = AppState::in_memory();
    seed_product(&state, "Pen", 3).await;

    let client = InProcessClient { state };
    assert_eq!(report::run(&client, &sink).await.unwrap(), JobStatus::Success);
    assert_eq!(
        report::run(&UnreachableClient, &sink).await.unwrap(),
        JobStatus::Success
    );

    let content = read(sink.path()).await;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2, "{content}");
    let report_line =
        Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} - Report: 0 customers, 0 orders, 0 revenue$")
            .unwrap();
    assert!(report_line.is_match(lines[0]), "{content}");
    assert!(lines[1].contains(" - GraphQL Error: unexpected status 503"));
}

#[tokio::test]
async fn http_client_returns_operation_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/execute"))
        .and(body_partial_json(json!({ "operation": "hello" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": "Hello, GraphQL!", "errors": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpApiClient::new(
        format!("{}/api/execute", server.uri()),
        3,
        Duration::from_secs(5),
    )
    .unwrap();

    let data = client.execute("hello", json!({})).await.unwrap();
    assert_eq!(data, json!("Hello, GraphQL!"));
}

#[tokio::test]
async fn http_client_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/execute"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let client = HttpApiClient::new(
        format!("{}/api/execute", server.uri()),
        3,
        Duration::from_secs(5),
    )
    .unwrap()
    .with_retry_delay(Duration::from_millis(1));

    let err = client.execute("totalOrders", json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
}

#[tokio::test]
async fn http_client_does_not_retry_rejected_operations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "code": "CONFLICT", "message": "Email already exists." }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpApiClient::new(
        format!("{}/api/execute", server.uri()),
        3,
        Duration::from_secs(5),
    )
    .unwrap()
    .with_retry_delay(Duration::from_millis(1));

    let err = client
        .execute("createCustomer", json!({ "name": "Ada Lovelace", "email": "ada@example.com" }))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api(ref errors) if errors[0].code == "CONFLICT"));
    assert_eq!(err.to_string(), "CONFLICT: Email already exists.");
}
