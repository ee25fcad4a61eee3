//! Subtask HTTP Handlers
//!
//! All routes are nested under the parent task; each handler loads the
//! task first and authorizes against it. Progress updates are also open
//! to the subtask's assignee.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{
    db, AddDependencyRequest, CreateSubtaskRequest, Subtask, UpdateProgressRequest,
    UpdateSubtaskRequest,
};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource};
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

async fn load_subtask(
    state: &AppState,
    task_id: Uuid,
    subtask_id: Uuid,
) -> Result<Subtask, ApiError> {
    db::get_subtask(&state.pool, subtask_id)
        .await?
        .filter(|s| s.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("Subtask not found"))
}

fn task_room(task: &Task) -> Room {
    match task.team_id {
        Some(team_id) => Room::Team(team_id),
        None => Room::User(task.creator_id),
    }
}

fn validate_progress(progress: i32) -> Result<(), ApiError> {
    if (0..=100).contains(&progress) {
        Ok(())
    } else {
        Err(ApiError::bad_request("Progress must be between 0 and 100"))
    }
}

/// A dependency must be a different subtask of the same task
fn validate_dependency(
    subtask_id: Uuid,
    task_id: Uuid,
    dependency: &Subtask,
) -> Result<(), ApiError> {
    if dependency.task_id != task_id {
        return Err(ApiError::not_found("Dependency subtask not found"));
    }
    if dependency.id == subtask_id {
        return Err(ApiError::bad_request("A subtask cannot depend on itself"));
    }
    Ok(())
}

async fn notify_assignee(state: &AppState, task: &Task, subtask: &Subtask, actor: Uuid) {
    let Some(assignee) = subtask.assigned_to else {
        return;
    };
    if assignee == actor {
        return;
    }
    notifications::dispatch(
        &state.pool,
        &state.realtime,
        assignee,
        "subtask_assigned",
        "Subtask assigned",
        &format!(
            "You were assigned to \"{}\" on the task \"{}\"",
            subtask.title, task.title
        ),
        serde_json::json!({ "task_id": task.id, "subtask_id": subtask.id }),
    )
    .await;
}

/// GET /api/tasks/{task_id}/subtasks
pub async fn get_subtasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Subtask>>, ApiError> {
    load_authorized_task(&state, task_id, user.id, Action::Read).await?;
    Ok(Json(db::list_subtasks(&state.pool, task_id).await?))
}

/// POST /api/tasks/{task_id}/subtasks
pub async fn create_subtask(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(body): Json<CreateSubtaskRequest>,
) -> Result<(StatusCode, Json<Subtask>), ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Post).await?;

    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Subtask title is required"));
    }

    let subtask = db::create_subtask(
        &state.pool,
        task_id,
        user.id,
        title,
        body.description.as_deref(),
        body.sort_order.unwrap_or(0),
        body.assigned_to,
        body.due_date,
    )
    .await?;

    notify_assignee(&state, &task, &subtask, user.id).await;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("subtask:created", serde_json::to_value(&subtask)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::SubtaskCreated { task_id, subtask_id: subtask.id },
    )
    .await;

    Ok((StatusCode::CREATED, Json(subtask)))
}

/// PUT /api/tasks/{task_id}/subtasks/{subtask_id}
pub async fn update_subtask(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateSubtaskRequest>,
) -> Result<Json<Subtask>, ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Update).await?;
    let existing = load_subtask(&state, task_id, subtask_id).await?;

    if let Some(progress) = body.progress {
        validate_progress(progress)?;
    }

    let subtask = db::update_subtask(
        &state.pool,
        subtask_id,
        body.title.as_deref().map(str::trim),
        body.description.as_deref(),
        body.completed,
        body.progress,
        body.sort_order,
        body.assigned_to,
        body.due_date,
    )
    .await?;

    // Reassignment notifies the new assignee only
    if subtask.assigned_to != existing.assigned_to {
        notify_assignee(&state, &task, &subtask, user.id).await;
    }

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("subtask:updated", serde_json::to_value(&subtask)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::SubtaskUpdated { task_id, subtask_id },
    )
    .await;

    Ok(Json(subtask))
}

/// PATCH /api/tasks/{task_id}/subtasks/{subtask_id}/progress
///
/// Unlike the other subtask mutations, the assignee may report progress
/// on their own subtask without task-level mutation rights.
pub async fn update_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateProgressRequest>,
) -> Result<Json<Subtask>, ApiError> {
    let task = tasks::db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let existing = load_subtask(&state, task_id, subtask_id).await?;

    let access = tasks::handlers::load_task_access(&state, &task, user.id).await?;
    let may_update_task = authorize(user.id, Resource::Task(&access), Action::Update).is_ok();
    if !may_update_task && existing.assigned_to != Some(user.id) {
        return Err(ApiError::forbidden("Not authorized to update this subtask"));
    }

    validate_progress(body.progress)?;

    let subtask = db::update_progress(&state.pool, subtask_id, body.progress).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("subtask:updated", serde_json::to_value(&subtask)?),
    );

    Ok(Json(subtask))
}

/// POST /api/tasks/{task_id}/subtasks/{subtask_id}/dependencies
pub async fn add_dependency(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<AddDependencyRequest>,
) -> Result<Json<Subtask>, ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Update).await?;
    load_subtask(&state, task_id, subtask_id).await?;

    let dependency = db::get_subtask(&state.pool, body.dependency_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Dependency subtask not found"))?;
    validate_dependency(subtask_id, task_id, &dependency)?;

    let subtask = db::add_dependency(&state.pool, subtask_id, body.dependency_id).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("subtask:updated", serde_json::to_value(&subtask)?),
    );

    Ok(Json(subtask))
}

/// DELETE /api/tasks/{task_id}/subtasks/{subtask_id}/dependencies/{dependency_id}
pub async fn remove_dependency(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, subtask_id, dependency_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<Subtask>, ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Update).await?;
    load_subtask(&state, task_id, subtask_id).await?;

    let subtask = db::remove_dependency(&state.pool, subtask_id, dependency_id).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("subtask:updated", serde_json::to_value(&subtask)?),
    );

    Ok(Json(subtask))
}

/// DELETE /api/tasks/{task_id}/subtasks/{subtask_id}
pub async fn delete_subtask(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Delete).await?;
    load_subtask(&state, task_id, subtask_id).await?;

    db::delete_subtask(&state.pool, subtask_id).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new(
            "subtask:deleted",
            serde_json::json!({ "task_id": task_id, "id": subtask_id }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::SubtaskDeleted { task_id, subtask_id },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Subtask deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subtask(id: Uuid, task_id: Uuid) -> Subtask {
        Subtask {
            id,
            task_id,
            title: "step".to_string(),
            description: None,
            completed: false,
            progress: 0,
            sort_order: 0,
            creator_id: Uuid::new_v4(),
            assigned_to: None,
            due_date: None,
            dependencies: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_bounds() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
    }

    #[test]
    fn test_dependency_must_share_the_task() {
        let task_id = Uuid::new_v4();
        let subtask_id = Uuid::new_v4();

        let foreign = subtask(Uuid::new_v4(), Uuid::new_v4());
        assert!(validate_dependency(subtask_id, task_id, &foreign).is_err());

        let sibling = subtask(Uuid::new_v4(), task_id);
        assert!(validate_dependency(subtask_id, task_id, &sibling).is_ok());
    }

    #[test]
    fn test_self_dependency_is_rejected() {
        let task_id = Uuid::new_v4();
        let subtask_id = Uuid::new_v4();
        let itself = subtask(subtask_id, task_id);
        assert!(validate_dependency(subtask_id, task_id, &itself).is_err());
    }
}
