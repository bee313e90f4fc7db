use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::db::repositories::ReminderLogRepository;
use common::models::ReminderLogEntry;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListRemindersQuery {
    pub limit: Option<i64>,
}

/// Recent reminder ledger entries, newest first, for delivery auditing
#[tracing::instrument(skip(state))]
pub async fn list_reminders(
    State(state): State<AppState>,
    Query(query): Query<ListRemindersQuery>,
) -> Result<Json<Vec<ReminderLogEntry>>, ErrorResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let repo = ReminderLogRepository::new(state.db_pool.clone());
    let entries = repo.recent(limit).await?;

    tracing::debug!(count = entries.len(), "Listed reminder log entries");
    Ok(Json(entries))
}
