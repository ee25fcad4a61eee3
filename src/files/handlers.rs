//! File HTTP Handlers
//!
//! Upload writes the disk file before the metadata row and cleans the
//! file up when the row insert fails; delete removes the disk file
//! first and tolerates it already being gone.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{db, StoredFile, ALLOWED_MIME_TYPES, MAX_FILE_SIZE};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource};
use crate::error::ApiError;
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

/// Strips any path components a client may have smuggled into the name
pub(crate) fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .to_string()
}

/// Unlinks stored upload files, tolerating ones already gone
pub(crate) async fn remove_upload_files(upload_dir: &std::path::Path, paths: &[String]) {
    for path in paths {
        let full_path = upload_dir.join(path);
        if let Err(err) = tokio::fs::remove_file(&full_path).await {
            tracing::warn!("failed to remove file {}: {err}", full_path.display());
        }
    }
}

/// GET /api/tasks/{task_id}/files
pub async fn get_files(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<StoredFile>>, ApiError> {
    load_authorized_task(&state, task_id, user.id, Action::Read).await?;
    Ok(Json(db::list_files_for_task(&state.pool, task_id).await?))
}

/// POST /api/tasks/{task_id}/files
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Post).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("Invalid multipart body: {err}")))?
        .ok_or_else(|| ApiError::bad_request("No file in request"))?;

    let name = sanitize_file_name(field.file_name().unwrap_or("upload"));
    if name.is_empty() {
        return Err(ApiError::bad_request("File name is required"));
    }

    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(ApiError::bad_request(format!(
            "File type {mime_type} is not allowed"
        )));
    }

    let data = field
        .bytes()
        .await
        .map_err(|err| ApiError::bad_request(format!("Failed to read upload: {err}")))?;
    if data.len() > MAX_FILE_SIZE {
        return Err(ApiError::bad_request("File exceeds the 50 MB limit"));
    }

    let disk_name = format!("{}-{}", Uuid::new_v4(), name);
    let full_path = state.config.upload_dir.join(&disk_name);

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|err| ApiError::internal(format!("Failed to prepare upload dir: {err}")))?;
    tokio::fs::write(&full_path, &data)
        .await
        .map_err(|err| ApiError::internal(format!("Failed to store file: {err}")))?;

    let file = match db::create_file(
        &state.pool,
        task_id,
        user.id,
        &name,
        &disk_name,
        data.len() as i64,
        &mime_type,
    )
    .await
    {
        Ok(file) => file,
        Err(err) => {
            // Orphaned disk file, remove it before reporting the failure
            let _ = tokio::fs::remove_file(&full_path).await;
            return Err(err.into());
        }
    };

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new("file:uploaded", serde_json::to_value(&file)?),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::FileUploaded {
            task_id,
            file_id: file.id,
            file_name: file.name.clone(),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(file)))
}

/// DELETE /api/tasks/{task_id}/files/{file_id}
pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = load_authorized_task(&state, task_id, user.id, Action::Delete).await?;

    let file = db::get_file(&state.pool, file_id)
        .await?
        .filter(|f| f.task_id == task_id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let full_path = state.config.upload_dir.join(&file.path);
    if let Err(err) = tokio::fs::remove_file(&full_path).await {
        tracing::warn!("failed to remove file {}: {err}", full_path.display());
    }

    db::delete_file(&state.pool, file_id).await?;

    state.realtime.publish(
        task_room(&task),
        RealtimeEvent::new(
            "file:deleted",
            serde_json::json!({ "task_id": task_id, "id": file_id }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        task.team_id,
        ActivityDetails::FileDeleted {
            task_id,
            file_id,
            file_name: file.name.clone(),
        },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "File deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("plain.png"), "plain.png");
    }

    #[tokio::test]
    async fn test_remove_upload_files_unlinks_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept.bin");
        let removed = dir.path().join("removed.bin");
        tokio::fs::write(&kept, b"stay").await.unwrap();
        tokio::fs::write(&removed, b"go").await.unwrap();

        remove_upload_files(
            dir.path(),
            &["removed.bin".to_string(), "never-existed.bin".to_string()],
        )
        .await;

        assert!(kept.exists());
        assert!(!removed.exists());
    }
}
