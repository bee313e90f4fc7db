use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::calendar::render_ics;
use common::db::repositories::LicenseRepository;

/// iCalendar feed of license end dates, guarded by a shared token in the
/// URL path. No token configured means the feed is off entirely.
#[tracing::instrument(skip(state, token))]
pub async fn calendar_feed(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let configured = state.config.calendar.ics_token.as_deref();
    if !token_matches(configured, &token) {
        return Err(ErrorResponse::new("forbidden", "Invalid calendar token"));
    }

    let repo = LicenseRepository::new(state.db_pool.clone());
    let entries = repo.find_calendar_entries().await?;
    let ics = render_ics(&entries, &state.config.notifier.base_url, Utc::now());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        ics,
    ))
}

pub(crate) fn token_matches(configured: Option<&str>, supplied: &str) -> bool {
    match configured {
        Some(expected) => !expected.is_empty() && expected == supplied,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches_exact_value() {
        assert!(token_matches(Some("secret"), "secret"));
    }

    #[test]
    fn test_token_rejects_mismatch() {
        assert!(!token_matches(Some("secret"), "other"));
    }

    #[test]
    fn test_feed_disabled_without_token() {
        assert!(!token_matches(None, "anything"));
        assert!(!token_matches(None, ""));
    }

    #[test]
    fn test_empty_configured_token_disables_feed() {
        assert!(!token_matches(Some(""), ""));
    }
}
