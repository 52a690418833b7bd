use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    dto::customers::{
        BulkCreateCustomersInput, BulkCreateCustomersPayload, CreateCustomerInput,
        CreateCustomerPayload, CustomerDetail,
    },
    error::{AppError, AppResult},
    models::Customer,
    response::{ApiResponse, Meta},
    rules::{DeleteGuard, SaveRule, validate_phone},
    state::AppState,
    store::OrderFilter,
};

const CREATED_MESSAGE: &str = "Customer created successfully.";

pub async fn create_customer(
    state: &AppState,
    payload: CreateCustomerInput,
) -> AppResult<ApiResponse<CreateCustomerPayload>> {
    let customer = insert_new_customer(state, payload, Utc::now()).await?;
    tracing::info!(customer_id = %customer.id, "customer created");

    Ok(ApiResponse::success(
        CREATED_MESSAGE,
        CreateCustomerPayload {
            customer,
            message: CREATED_MESSAGE.to_string(),
        },
        Some(Meta::empty()),
    ))
}

/// Each entry is handled on its own; a rejected entry is reported as
/// `"Entry {index}: {reason}"` and the batch carries on.
pub async fn bulk_create_customers(
    state: &AppState,
    payload: BulkCreateCustomersInput,
) -> AppResult<ApiResponse<BulkCreateCustomersPayload>> {
    let mut customers = Vec::new();
    let mut errors = Vec::new();

    for (index, entry) in payload.input.into_iter().enumerate() {
        match insert_new_customer(state, entry, Utc::now()).await {
            Ok(customer) => customers.push(customer),
            Err(err) => {
                tracing::debug!(index, error = %err, "bulk customer entry rejected");
                errors.push(format!("Entry {index}: {err}"));
            }
        }
    }

    tracing::info!(
        created = customers.len(),
        rejected = errors.len(),
        "bulk customer import finished"
    );
    let message = format!(
        "{} customer(s) created, {} error(s).",
        customers.len(),
        errors.len()
    );
    let total = customers.len() as i64;
    Ok(ApiResponse::success(
        message,
        BulkCreateCustomersPayload { customers, errors },
        Some(Meta::with_total(total)),
    ))
}

pub async fn get_customer(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CustomerDetail>> {
    let customer = state
        .store
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    let orders = state
        .store
        .list_orders(&OrderFilter::for_customer(id))
        .await?;

    Ok(ApiResponse::success(
        "Customer",
        CustomerDetail::evaluate(customer, &orders, Utc::now()),
        None,
    ))
}

pub async fn delete_customer(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let customer = state
        .store
        .get_customer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    let orders = state
        .store
        .list_orders(&OrderFilter::for_customer(id))
        .await?;
    customer.validate_for_delete(&orders)?;

    if !state.store.delete_customer(id).await? {
        return Err(AppError::not_found("Customer"));
    }
    tracing::info!(customer_id = %id, "customer deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

async fn insert_new_customer(
    state: &AppState,
    input: CreateCustomerInput,
    now: DateTime<Utc>,
) -> AppResult<Customer> {
    let phone = input.phone.filter(|phone| !phone.trim().is_empty());
    validate_phone(phone.as_deref())?;

    let email = input.email.trim();
    if state.store.find_customer_by_email(email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists.".into()));
    }

    let (first_name, last_name) = split_name(&input.name);
    let customer = Customer::new(first_name, last_name, email, phone, now);
    customer.validate_for_save()?;

    // The store rejects a concurrent duplicate that slipped past the check above.
    Ok(state.store.insert_customer(customer).await?)
}

fn split_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}
