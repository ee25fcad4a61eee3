//! Task HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{
    db, CreateTaskRequest, ReorderRequest, Task, TaskDetails, TaskPriority, TaskStatus, TaskView,
    UpdateTaskRequest, UpdateTaskStatusRequest,
};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource, TaskAccess, TeamAccess};
use crate::comments;
use crate::error::ApiError;
use crate::files;
use crate::notifications;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::subtasks;
use crate::teams;
use crate::users;

/// Builds the authorization projection for a task, loading the team
/// standing when the task belongs to one
pub(crate) async fn load_task_access(
    state: &AppState,
    task: &Task,
    actor: Uuid,
) -> Result<TaskAccess, ApiError> {
    let team = match task.team_id {
        Some(team_id) => {
            let team = teams::db::get_team(&state.pool, team_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Team not found"))?;
            let role = teams::db::get_member_role(&state.pool, team_id, actor).await?;
            Some(TeamAccess { owner_id: team.owner_id, role })
        }
        None => None,
    };
    Ok(TaskAccess { creator_id: task.creator_id, team })
}

/// Events about a team task go to the team room; personal tasks to the
/// creator's own room.
fn task_room(task: &Task) -> Room {
    match task.team_id {
        Some(team_id) => Room::Team(team_id),
        None => Room::User(task.creator_id),
    }
}

async fn with_assignees(state: &AppState, task: Task) -> Result<TaskView, ApiError> {
    let ids = db::list_assignee_ids(&state.pool, task.id).await?;
    let assignees = if ids.is_empty() {
        Vec::new()
    } else {
        users::db::get_user_summaries(&state.pool, &ids).await?
    };
    Ok(TaskView { task, assignees })
}

/// GET /api/tasks
pub async fn get_tasks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let tasks = db::list_tasks_for_user(&state.pool, user.id).await?;

    let mut views = Vec::with_capacity(tasks.len());
    for task in tasks {
        views.push(with_assignees(&state, task).await?);
    }
    Ok(Json(views))
}

/// GET /api/tasks/{task_id}
///
/// Embeds every child collection; collections with no rows come back as
/// empty arrays.
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskDetails>, ApiError> {
    let task = db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = load_task_access(&state, &task, user.id).await?;
    authorize(user.id, Resource::Task(&access), Action::Read)?;

    let ids = db::list_assignee_ids(&state.pool, task_id).await?;
    let assignees = if ids.is_empty() {
        Vec::new()
    } else {
        users::db::get_user_summaries(&state.pool, &ids).await?
    };
    let subtasks = subtasks::db::list_subtasks(&state.pool, task_id).await?;
    let comments = comments::db::list_comment_tree(&state.pool, task_id).await?;
    let files = files::db::list_files_for_task(&state.pool, task_id).await?;

    Ok(Json(TaskDetails { task, assignees, subtasks, comments, files }))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Task title is required"));
    }

    // Creating under a team requires membership in that team
    if let Some(team_id) = body.team_id {
        let team = teams::db::get_team(&state.pool, team_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Team not found"))?;
        let role = teams::db::get_member_role(&state.pool, team_id, user.id).await?;
        if team.owner_id != user.id && role.is_none() {
            return Err(ApiError::forbidden("Not a member of this team"));
        }
    }

    let assignees = body.assignees.unwrap_or_default();
    let task = db::create_task(
        &state.pool,
        user.id,
        title,
        body.description.as_deref(),
        body.status.unwrap_or(TaskStatus::Todo),
        body.priority.unwrap_or(TaskPriority::Medium),
        body.due_date,
        body.team_id,
        &assignees,
    )
    .await?;

    for assignee in assignees.iter().filter(|id| **id != user.id) {
        notifications::dispatch(
            &state.pool,
            &state.realtime,
            *assignee,
            "task_created",
            "New task assigned",
            &format!("You were assigned to the task \"{}\"", task.title),
            serde_json::json!({ "task_id": task.id }),
        )
        .await;
    }

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("task:created", serde_json::to_value(&task)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::TaskCreated { task_id: task.id },
    )
    .await;

    let view = with_assignees(&state, task).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/tasks/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>, ApiError> {
    let task = db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = load_task_access(&state, &task, user.id).await?;
    authorize(user.id, Resource::Task(&access), Action::Update)?;

    let task = db::update_task(
        &state.pool,
        task_id,
        body.title.as_deref().map(str::trim),
        body.description.as_deref(),
        body.status,
        body.priority,
        body.due_date,
    )
    .await?;

    if let Some(assignees) = &body.assignees {
        let before = db::list_assignee_ids(&state.pool, task_id).await?;
        db::set_assignees(&state.pool, task_id, assignees).await?;

        for added in assignees
            .iter()
            .filter(|id| !before.contains(id) && **id != user.id)
        {
            notifications::dispatch(
                &state.pool,
                &state.realtime,
                *added,
                "task_assigned",
                "Task assigned",
                &format!("You were assigned to the task \"{}\"", task.title),
                serde_json::json!({ "task_id": task.id }),
            )
            .await;
        }
    }

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("task:updated", serde_json::to_value(&task)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::TaskUpdated { task_id },
    )
    .await;

    Ok(Json(with_assignees(&state, task).await?))
}

/// PUT /api/tasks/{task_id}/status
pub async fn update_task_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    Json(body): Json<UpdateTaskStatusRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = load_task_access(&state, &task, user.id).await?;
    authorize(user.id, Resource::Task(&access), Action::Update)?;

    let task = db::update_status(&state.pool, task_id, body.status).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("task:updated", serde_json::to_value(&task)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::TaskUpdated { task_id },
    )
    .await;

    Ok(Json(task))
}

/// PUT /api/tasks/reorder
///
/// Batch of (id, sort_order) pairs; every referenced task must be
/// accessible to the caller, otherwise the whole batch is rejected.
pub async fn reorder_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    for item in &body.tasks {
        let task = db::get_task(&state.pool, item.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        let access = load_task_access(&state, &task, user.id).await?;
        authorize(user.id, Resource::Task(&access), Action::Update)?;
    }

    for item in &body.tasks {
        db::update_sort_order(&state.pool, item.id, item.sort_order).await?;
    }

    state.realtime.publish(
        Room::User(user.id),
        RealtimeEvent::new(
            "tasks:reordered",
            serde_json::json!({
                "tasks": body.tasks.iter()
                    .map(|i| serde_json::json!({ "id": i.id, "sort_order": i.sort_order }))
                    .collect::<Vec<_>>()
            }),
        ),
    );

    Ok(Json(serde_json::json!({ "message": "Tasks reordered" })))
}

/// DELETE /api/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = db::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let access = load_task_access(&state, &task, user.id).await?;
    authorize(user.id, Resource::Task(&access), Action::Delete)?;

    let paths = db::delete_task_cascade(&state.pool, task_id).await?;

    // Attached files are removed from disk after the rows are gone; a
    // missing file is logged, not an error.
    for path in paths {
        let full = state.config.upload_dir.join(&path);
        if let Err(err) = tokio::fs::remove_file(&full).await {
            tracing::warn!("failed to remove file {}: {err}", full.display());
        }
    }

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("task:deleted", serde_json::json!({ "id": task_id })),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::TaskDeleted { task_id },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Task deleted" })))
}
