use axum::{extract::State, Json};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::db::repositories::{CustomerRepository, LicenseRepository, ProductRepository};
use common::models::UpcomingLicense;

/// How far ahead the dashboard looks for upcoming expirations
const LOOKAHEAD_DAYS: i64 = 60;
const UPCOMING_LIMIT: i64 = 12;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub customers: i64,
    pub products: i64,
    pub licenses: i64,
    pub upcoming: Vec<UpcomingExpiration>,
}

/// An upcoming expiration annotated with the days left until it happens
#[derive(Debug, Serialize)]
pub struct UpcomingExpiration {
    #[serde(flatten)]
    pub license: UpcomingLicense,
    pub days_remaining: i64,
}

pub(crate) fn days_remaining(today: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

/// Entity counts plus the expirations landing within the next 60 days
#[tracing::instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ErrorResponse> {
    let customer_repo = CustomerRepository::new(state.db_pool.clone());
    let product_repo = ProductRepository::new(state.db_pool.clone());
    let license_repo = LicenseRepository::new(state.db_pool.clone());

    let customers = customer_repo.count().await?;
    let products = product_repo.count().await?;
    let licenses = license_repo.count().await?;

    let today = Utc::now().date_naive();
    let upcoming = license_repo
        .find_upcoming(today, today + Duration::days(LOOKAHEAD_DAYS), UPCOMING_LIMIT)
        .await?
        .into_iter()
        .map(|license| UpcomingExpiration {
            days_remaining: days_remaining(today, license.end_date),
            license,
        })
        .collect();

    Ok(Json(DashboardResponse {
        customers,
        products,
        licenses,
        upcoming,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_remaining_counts_forward() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 9).unwrap();
        assert_eq!(days_remaining(today, end), 30);
    }

    #[test]
    fn test_days_remaining_zero_on_expiry_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(days_remaining(today, today), 0);
    }
}
