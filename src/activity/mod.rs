/**
 * Activity Log
 *
 * Append-only audit trail. Controllers call `record` after a successful
 * mutation; a recording failure is logged and never fails the primary
 * operation. Rows are never updated or deleted.
 */

pub mod db;
pub mod details;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

pub use details::ActivityDetails;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub team_id: Option<Uuid>,
    pub action: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Append an audit entry, best-effort
pub async fn record(
    pool: &PgPool,
    actor_id: Uuid,
    team_id: Option<Uuid>,
    details: ActivityDetails,
) {
    let action = details.action();
    let payload = serde_json::to_value(&details).unwrap_or_default();

    if let Err(err) = db::append_entry(pool, actor_id, team_id, action, &payload).await {
        tracing::warn!("failed to record activity '{action}' for {actor_id}: {err}");
    }
}
