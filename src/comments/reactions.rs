//! Reaction HTTP Handlers
//!
//! Adding the same reaction twice is a conflict; removing an absent one
//! is a no-op. Both return the comment's rendered reaction map.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::handlers::load_comment;
use super::{db, ReactionMap, ReactionRequest};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource};
use crate::error::ApiError;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::tasks;

async fn load_authorized_room(
    state: &AppState,
    task_id: Uuid,
    actor: Uuid,
) -> Result<Room, ApiError> {
    let task = tasks::db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = tasks::handlers::load_task_access(state, &task, actor).await?;
    authorize(actor, Resource::Task(&access), Action::Post)?;

    Ok(match task.team_id {
        Some(team_id) => Room::Team(team_id),
        None => Room::User(task.creator_id),
    })
}

/// POST /api/tasks/{task_id}/comments/{comment_id}/reactions
pub async fn add_reaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<ReactionMap>, ApiError> {
    let room = load_authorized_room(&state, task_id, user.id).await?;
    load_comment(&state, task_id, comment_id).await?;

    let reaction = body.reaction.trim();
    if reaction.is_empty() {
        return Err(ApiError::bad_request("Reaction is required"));
    }

    if db::has_reaction(&state.pool, comment_id, user.id, reaction).await? {
        return Err(ApiError::conflict("Already reacted with this reaction"));
    }
    // A concurrent duplicate insert still trips the unique index and
    // surfaces as a conflict through error classification.
    db::add_reaction(&state.pool, comment_id, user.id, reaction).await?;

    let map = db::get_reaction_map(&state.pool, comment_id).await?;

    state.realtime.publish(
        room,
        RealtimeEvent::new(
            "comment:reaction",
            serde_json::json!({
                "task_id": task_id,
                "comment_id": comment_id,
                "reactions": map,
            }),
        ),
    );

    Ok(Json(map))
}

/// DELETE /api/tasks/{task_id}/comments/{comment_id}/reactions/{reaction}
pub async fn remove_reaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, comment_id, reaction)): Path<(Uuid, Uuid, String)>,
) -> Result<Json<ReactionMap>, ApiError> {
    let room = load_authorized_room(&state, task_id, user.id).await?;
    load_comment(&state, task_id, comment_id).await?;

    db::remove_reaction(&state.pool, comment_id, user.id, &reaction).await?;

    let map = db::get_reaction_map(&state.pool, comment_id).await?;

    state.realtime.publish(
        room,
        RealtimeEvent::new(
            "comment:reaction",
            serde_json::json!({
                "task_id": task_id,
                "comment_id": comment_id,
                "reactions": map,
            }),
        ),
    );

    Ok(Json(map))
}
