//! Activity Log HTTP Handlers
//!
//! Read-only surface; entries are written internally by `activity::record`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{db, ActivityEntry};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::server::state::AppState;
use crate::teams;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub action: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub logs: Vec<ActivityEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/activity/me
pub async fn get_own_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let logs = db::list_user_entries(
        &state.pool,
        user.id,
        query.action.as_deref(),
        query.start_date,
        query.end_date,
        limit,
        offset,
    )
    .await?;
    let total = db::count_user_entries(
        &state.pool,
        user.id,
        query.action.as_deref(),
        query.start_date,
        query.end_date,
    )
    .await?;

    Ok(Json(ActivityListResponse { logs, total, limit, offset }))
}

/// GET /api/activity/teams/{team_id}
///
/// Team activity is visible to members of the team only.
pub async fn get_team_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityListResponse>, ApiError> {
    let team = teams::db::get_team(&state.pool, team_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;

    let role = teams::db::get_member_role(&state.pool, team_id, user.id).await?;
    if team.owner_id != user.id && role.is_none() {
        return Err(ApiError::forbidden("No access to this team"));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let logs = db::list_team_entries(&state.pool, team_id, limit, offset).await?;
    let total = db::count_team_entries(&state.pool, team_id).await?;

    Ok(Json(ActivityListResponse { logs, total, limit, offset }))
}
