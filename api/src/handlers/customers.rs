use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::handlers::ErrorResponse;
use crate::middleware::Identity;
use crate::state::AppState;
use common::db::repositories::CustomerRepository;
use common::models::{Customer, CustomerUpdate, NewCustomer};

/// List active customers, ordered by name
#[tracing::instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>, ErrorResponse> {
    let repo = CustomerRepository::new(state.db_pool.clone());
    let customers = repo.find_all_active().await?;

    tracing::debug!(count = customers.len(), "Listed customers");
    Ok(Json(customers))
}

/// Get a customer by id
#[tracing::instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Customer>, ErrorResponse> {
    let repo = CustomerRepository::new(state.db_pool.clone());
    let customer = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", format!("Customer not found: {}", id)))?;

    Ok(Json(customer))
}

/// Create a customer
#[tracing::instrument(skip(state, req), fields(user = %identity.email))]
pub async fn create_customer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ErrorResponse> {
    if req.name.trim().is_empty() {
        return Err(ErrorResponse::new(
            "validation_error",
            "Customer name is required",
        ));
    }

    let repo = CustomerRepository::new(state.db_pool.clone());
    let customer = repo.create(&req).await?;

    tracing::info!(customer_id = customer.id, user = %identity.email, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Update a customer
#[tracing::instrument(skip(state, req), fields(user = %identity.email))]
pub async fn update_customer(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<CustomerUpdate>,
) -> Result<Json<Customer>, ErrorResponse> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ErrorResponse::new(
                "validation_error",
                "Customer name cannot be empty",
            ));
        }
    }

    let repo = CustomerRepository::new(state.db_pool.clone());
    let customer = repo.update(id, &req).await?;

    tracing::info!(customer_id = id, user = %identity.email, "Customer updated");
    Ok(Json(customer))
}
