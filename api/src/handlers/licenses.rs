use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::handlers::ErrorResponse;
use crate::middleware::Identity;
use crate::state::AppState;
use common::db::repositories::LicenseRepository;
use common::models::{License, LicenseStatus, LicenseUpdate, LicenseWithNames, NewLicense};

#[derive(Debug, Deserialize)]
pub struct ListLicensesQuery {
    pub status: Option<String>,
}

/// List licenses joined with customer and product names, soonest end date
/// first; optional `?status=` filter
#[tracing::instrument(skip(state))]
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(query): Query<ListLicensesQuery>,
) -> Result<Json<Vec<LicenseWithNames>>, ErrorResponse> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            LicenseStatus::from_str(raw)
                .map_err(|e| ErrorResponse::new("validation_error", e))?,
        ),
        None => None,
    };

    let repo = LicenseRepository::new(state.db_pool.clone());
    let licenses = repo.find_all(status).await?;

    tracing::debug!(count = licenses.len(), "Listed licenses");
    Ok(Json(licenses))
}

/// Get a license by its public identifier
#[tracing::instrument(skip(state))]
pub async fn get_license(
    State(state): State<AppState>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<LicenseWithNames>, ErrorResponse> {
    let repo = LicenseRepository::new(state.db_pool.clone());
    let license = repo.find_by_public_id(public_id).await?.ok_or_else(|| {
        ErrorResponse::new("not_found", format!("License not found: {}", public_id))
    })?;

    Ok(Json(license))
}

/// Create a license; a fresh public identifier is generated server-side
#[tracing::instrument(skip(state, req), fields(user = %identity.email))]
pub async fn create_license(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<NewLicense>,
) -> Result<(StatusCode, Json<License>), ErrorResponse> {
    if req.customer_id <= 0 || req.product_id <= 0 {
        return Err(ErrorResponse::new(
            "validation_error",
            "customer_id and product_id are required",
        ));
    }

    let repo = LicenseRepository::new(state.db_pool.clone());
    let license = repo.create(&req).await?;

    tracing::info!(
        public_id = %license.public_id,
        user = %identity.email,
        "License created"
    );
    Ok((StatusCode::CREATED, Json(license)))
}

/// Update a license; absent fields keep their current value
#[tracing::instrument(skip(state, req), fields(user = %identity.email))]
pub async fn update_license(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(public_id): Path<Uuid>,
    Json(req): Json<LicenseUpdate>,
) -> Result<Json<License>, ErrorResponse> {
    let repo = LicenseRepository::new(state.db_pool.clone());
    let license = repo.update_by_public_id(public_id, &req).await?;

    tracing::info!(public_id = %public_id, user = %identity.email, "License updated");
    Ok(Json(license))
}
