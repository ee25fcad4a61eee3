//! User HTTP Handlers
//!
//! Account endpoints operate on the caller only; there is no
//! cross-account profile mutation surface.

use axum::{
    extract::{Query, State},
    Json,
};

use super::{
    db, CheckEmailRequest, CheckEmailResponse, SearchUsersQuery, UpdateProfileRequest,
    UpdateStatusRequest, User, UserSummary,
};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<User>, ApiError> {
    let record = db::get_user_by_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(record))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
    }

    let record = db::update_profile(
        &state.pool,
        user.id,
        body.name.as_deref().map(str::trim),
        body.avatar.as_deref(),
        body.preferences.as_ref(),
    )
    .await?;

    Ok(Json(record))
}

/// PATCH /api/users/me/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<User>, ApiError> {
    let record = db::update_status(&state.pool, user.id, body.status).await?;

    // Presence change is pushed to the user's own room so their other
    // sessions stay in sync.
    state.realtime.publish(
        Room::User(user.id),
        RealtimeEvent::new(
            "user:status",
            serde_json::json!({ "user_id": user.id, "status": body.status }),
        ),
    );

    Ok(Json(record))
}

/// GET /api/users/search?query=...
///
/// Matches names and emails case-insensitively, capped at ten hits.
pub async fn search_users(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchUsersQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let term = params.query.as_deref().unwrap_or("").trim().to_string();
    if term.is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let users = db::search_users(&state.pool, &term, 10).await?;
    Ok(Json(users))
}

/// POST /api/users/check-email
///
/// Existence check used before inviting someone to a team or chat.
pub async fn check_email(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>, ApiError> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let user = db::get_user_by_email(&state.pool, email).await?;
    Ok(Json(CheckEmailResponse {
        exists: user.is_some(),
        user: user.map(|u| UserSummary {
            id: u.id,
            name: u.name,
            email: u.email,
            avatar: u.avatar,
        }),
    }))
}
