//! Notification HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::{db, ListNotificationsQuery, ListNotificationsResponse, Notification, Pagination};
use crate::auth::AuthUser;
use crate::authz::{self, Action, NotificationAccess, Resource};
use crate::error::ApiError;
use crate::server::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications =
        db::list_notifications(&state.pool, user.id, unread_only, limit, offset).await?;
    let total = db::count_notifications(&state.pool, user.id, unread_only).await?;
    let unread_count = db::count_notifications(&state.pool, user.id, true).await?;

    Ok(Json(ListNotificationsResponse {
        notifications,
        pagination: Pagination { total, limit, offset },
        unread_count,
    }))
}

/// PATCH /api/notifications/{id}/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = db::get_notification(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    let access = NotificationAccess { recipient_id: notification.recipient_id };
    authz::authorize(user.id, Resource::Notification(&access), Action::Update)?;

    let updated = db::mark_read(&state.pool, id).await?;
    Ok(Json(updated))
}

/// PATCH /api/notifications/read-all
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = db::mark_all_read(&state.pool, user.id).await?;
    Ok(Json(serde_json::json!({
        "message": "All notifications marked as read",
        "updated": updated,
    })))
}

/// DELETE /api/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let notification = db::get_notification(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    let access = NotificationAccess { recipient_id: notification.recipient_id };
    authz::authorize(user.id, Resource::Notification(&access), Action::Delete)?;

    db::delete_notification(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "message": "Notification deleted" })))
}
