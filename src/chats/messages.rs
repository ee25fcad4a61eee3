//! Message HTTP Handlers
//!
//! Sending requires chat membership; editing and deleting are reserved
//! for the message author.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::load_chat_access;
use super::{
    db, EditMessageRequest, ListMessagesQuery, Message, MessageFile, MessageType, MessageView,
    SendMessageRequest,
};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, MessageAccess, Resource};
use crate::error::ApiError;
use crate::files::{handlers::sanitize_file_name, ALLOWED_MIME_TYPES, MAX_FILE_SIZE};
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::users;

const DEFAULT_LIMIT: i64 = 100;

/// Disk name of an attachment served under the static uploads route;
/// None for externally hosted urls, which have no local file.
fn upload_disk_name(url: &str) -> Option<&str> {
    url.strip_prefix("/uploads/").filter(|name| !name.is_empty())
}

/// Loads a message scoped to its chat; a mismatch reads as missing.
async fn load_message(
    state: &AppState,
    chat_id: Uuid,
    message_id: Uuid,
) -> Result<Message, ApiError> {
    db::get_message(&state.pool, message_id)
        .await?
        .filter(|m| m.chat_id == chat_id)
        .ok_or_else(|| ApiError::not_found("Message not found"))
}

/// GET /api/chats/{chat_id}/messages
pub async fn get_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let (_, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Read)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    Ok(Json(
        db::list_messages(&state.pool, chat_id, limit, offset).await?,
    ))
}

/// POST /api/chats/{chat_id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let (_, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Post)?;

    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    if let Some(reply_to) = body.reply_to {
        load_message(&state, chat_id, reply_to).await?;
    }

    let files = body.files.unwrap_or_default();
    let message = db::create_message(
        &state.pool,
        chat_id,
        user.id,
        content,
        body.message_type.unwrap_or(MessageType::Text),
        body.reply_to,
        &files,
    )
    .await?;

    let author = users::db::get_user_summaries(&state.pool, &[user.id])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let files = db::list_message_files(&state.pool, message.id).await?;
    let view = MessageView { message, author, files };

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new("chat:message:new", serde_json::to_value(&view)?),
    );

    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/chats/{chat_id}/messages/{message_id}
pub async fn edit_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<EditMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let (_, chat_access) = load_chat_access(&state, chat_id, user.id).await?;
    let message = load_message(&state, chat_id, message_id).await?;

    let access = MessageAccess { author_id: message.author_id, chat: chat_access };
    authorize(user.id, Resource::Message(&access), Action::Update)?;

    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("Message content is required"));
    }

    let message = db::update_message(&state.pool, message_id, content).await?;

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new("chat:message:edit", serde_json::to_value(&message)?),
    );

    Ok(Json(message))
}

/// DELETE /api/chats/{chat_id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (_, chat_access) = load_chat_access(&state, chat_id, user.id).await?;
    let message = load_message(&state, chat_id, message_id).await?;

    let access = MessageAccess { author_id: message.author_id, chat: chat_access };
    authorize(user.id, Resource::Message(&access), Action::Delete)?;

    db::delete_message(&state.pool, message_id).await?;

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new(
            "chat:message:delete",
            serde_json::json!({ "chat_id": chat_id, "id": message_id }),
        ),
    );

    Ok(Json(serde_json::json!({ "message": "Message deleted" })))
}

/// POST /api/chats/{chat_id}/messages/{message_id}/files
///
/// Stores the upload on disk next to the task attachments and records
/// it under the message; the row's url points at the static route.
pub async fn upload_message_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MessageFile>), ApiError> {
    let (_, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Post)?;
    load_message(&state, chat_id, message_id).await?;

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

    let url = format!("/uploads/{disk_name}");
    let file = match db::create_message_file(
        &state.pool,
        message_id,
        &name,
        &url,
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
        Room::Chat(chat_id),
        RealtimeEvent::new(
            "chat:file:uploaded",
            serde_json::json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "file": file,
            }),
        ),
    );

    Ok((StatusCode::CREATED, Json(file)))
}

/// DELETE /api/chats/{chat_id}/messages/{message_id}/files/{file_id}
pub async fn delete_message_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, message_id, file_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (_, chat_access) = load_chat_access(&state, chat_id, user.id).await?;
    let message = load_message(&state, chat_id, message_id).await?;

    let access = MessageAccess { author_id: message.author_id, chat: chat_access };
    authorize(user.id, Resource::Message(&access), Action::Delete)?;

    let file = db::get_message_file(&state.pool, file_id)
        .await?
        .filter(|f| f.message_id == message_id)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if let Some(disk_name) = upload_disk_name(&file.url) {
        let full_path = state.config.upload_dir.join(disk_name);
        if let Err(err) = tokio::fs::remove_file(&full_path).await {
            tracing::warn!("failed to remove file {}: {err}", full_path.display());
        }
    }

    db::delete_message_file(&state.pool, file_id).await?;

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new(
            "chat:file:deleted",
            serde_json::json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "id": file_id,
            }),
        ),
    );

    Ok(Json(serde_json::json!({ "message": "File deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_disk_name_only_matches_local_files() {
        assert_eq!(
            upload_disk_name("/uploads/abc-report.pdf"),
            Some("abc-report.pdf")
        );
        assert_eq!(upload_disk_name("/uploads/"), None);
        assert_eq!(upload_disk_name("https://cdn.example.com/x.png"), None);
    }
}
