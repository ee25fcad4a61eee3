//! Comment HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{db, Comment, CommentView, CreateCommentRequest, UpdateCommentRequest};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, CommentAccess, Resource};
use crate::error::ApiError;
use crate::notifications;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::tasks::{self, Task};

async fn load_authorized_task(
    state: &AppState,
    task_id: Uuid,
    actor: Uuid,
    action: Action,
) -> Result<Task, ApiError> {
    let task = tasks::db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = tasks::handlers::load_task_access(state, &task, actor).await?;
    authorize(actor, Resource::Task(&access), action)?;
    Ok(task)
}

fn task_room(task: &Task) -> Room {
    match task.team_id {
        Some(team_id) => Room::Team(team_id),
        None => Room::User(task.creator_id),
    }
}

/// Loads a comment scoped to a task; a comment under a different task is
/// indistinguishable from a missing one.
pub(crate) async fn load_comment(
    state: &AppState,
    task_id: Uuid,
    comment_id: Uuid,
) -> Result<Comment, ApiError> {
    db::get_comment(&state.pool, comment_id)
        .await?
        .filter(|c| c.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Comment not found"))
}

/// GET /api/tasks/{task_id}/comments
pub async fn get_comments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    load_authorized_task(&state, task_id, user.id, Action::Read).await?;
    Ok(Json(db::list_comment_tree(&state.pool, task_id).await?))
}

/// POST /api/tasks/{task_id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Post).await?;

    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Comment text is required"));
    }

    if let Some(parent_id) = body.parent_id {
        let parent = load_comment(&state, task_id, parent_id).await?;
        if parent.parent_id.is_some() {
            return Err(ApiError::bad_request("Cannot reply to a reply"));
        }
    }

    let comment = db::create_comment(&state.pool, task_id, user.id, body.parent_id, text).await?;

    // Commenting on someone else's task notifies the task creator
    if task.creator_id != user.id {
        notifications::dispatch(
            &state.pool,
            &state.realtime,
            task.creator_id,
            "comment_added",
            "New comment",
            &format!("{} commented on your task \"{}\"", user.name, task.title),
            serde_json::json!({ "task_id": task_id, "comment_id": comment.id }),
        )
        .await;
    }

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("comment:created", serde_json::to_value(&comment)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::CommentAdded { task_id, comment_id: comment.id },
    )
    .await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/tasks/{task_id}/comments/{comment_id}
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let task = tasks::db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let comment = load_comment(&state, task_id, comment_id).await?;

    let task_access = tasks::handlers::load_task_access(&state, &task, user.id).await?;
    let access = CommentAccess { author_id: comment.author_id, task: task_access };
    authorize(user.id, Resource::Comment(&access), Action::Update)?;

    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("Comment text is required"));
    }

    let comment = db::update_comment(&state.pool, comment_id, text).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("comment:updated", serde_json::to_value(&comment)?),
    );

    Ok(Json(comment))
}

/// DELETE /api/tasks/{task_id}/comments/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = tasks::db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let comment = load_comment(&state, task_id, comment_id).await?;

    let task_access = tasks::handlers::load_task_access(&state, &task, user.id).await?;
    let access = CommentAccess { author_id: comment.author_id, task: task_access };
    authorize(user.id, Resource::Comment(&access), Action::Delete)?;

    db::delete_comment_tree(&state.pool, comment_id).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new(
            "comment:deleted",
            serde_json::json!({ "task_id": task_id, "id": comment_id }),
        ),
    );

    Ok(Json(serde_json::json!({ "message": "Comment deleted" })))
}
