use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::handlers::ErrorResponse;
use crate::middleware::Identity;
use crate::state::AppState;
use common::db::repositories::ProductRepository;
use common::models::{NewProduct, Product};

/// List all products, ordered by vendor and name
#[tracing::instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ErrorResponse> {
    let repo = ProductRepository::new(state.db_pool.clone());
    let products = repo.find_all().await?;

    tracing::debug!(count = products.len(), "Listed products");
    Ok(Json(products))
}

/// Get a product by id
#[tracing::instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ErrorResponse> {
    let repo = ProductRepository::new(state.db_pool.clone());
    let product = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ErrorResponse::new("not_found", format!("Product not found: {}", id)))?;

    Ok(Json(product))
}

/// Create a product
#[tracing::instrument(skip(state, req), fields(user = %identity.email))]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ErrorResponse> {
    if req.name.trim().is_empty() {
        return Err(ErrorResponse::new(
            "validation_error",
            "Product name is required",
        ));
    }

    let repo = ProductRepository::new(state.db_pool.clone());
    let product = repo.create(&req).await?;

    tracing::info!(product_id = product.id, user = %identity.email, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}
