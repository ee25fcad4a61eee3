/**
 * Notifications
 *
 * Per-user notification rows plus the internal dispatch helper other
 * controllers call after a successful mutation. Dispatch persists the
 * row and pushes it to the recipient's personal room; both steps are
 * best-effort: a failure is logged and never fails the caller.
 */

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::realtime::{RealtimeEvent, RealtimeHub, Room};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    pub notifications: Vec<Notification>,
    pub pagination: Pagination,
    pub unread_count: i64,
}

/// Persist a notification and push it to the recipient's room
///
/// Failures are logged only; the primary operation that triggered the
/// notification must not be rolled back or failed by them.
pub async fn dispatch(
    pool: &PgPool,
    hub: &RealtimeHub,
    recipient_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    payload: serde_json::Value,
) {
    match db::create_notification(pool, recipient_id, kind, title, message, &payload).await {
        Ok(notification) => {
            let event = RealtimeEvent::new(
                "notification",
                serde_json::to_value(&notification).unwrap_or_default(),
            );
            hub.publish(Room::User(recipient_id), event);
        }
        Err(err) => {
            tracing::warn!("failed to persist notification for {recipient_id}: {err}");
        }
    }
}
