//! Chat HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{db, AddChatUserRequest, Chat, ChatView, CreateChatRequest};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, ChatAccess, Resource};
use crate::error::ApiError;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::users;

pub(crate) async fn load_chat_access(
    state: &AppState,
    chat_id: Uuid,
    actor: Uuid,
) -> Result<(Chat, ChatAccess), ApiError> {
    let chat = db::get_chat(&state.pool, chat_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chat not found"))?;
    let role = db::get_chat_role(&state.pool, chat_id, actor).await?;
    let access = ChatAccess { owner_id: chat.owner_id, role };
    Ok((chat, access))
}

async fn build_view(state: &AppState, chat: Chat, viewer: Uuid) -> Result<ChatView, ApiError> {
    let members = db::list_chat_members(&state.pool, chat.id).await?;
    let unread_count = db::count_unread(&state.pool, chat.id, viewer).await?;
    Ok(ChatView { chat, members, unread_count })
}

/// GET /api/chats
pub async fn get_chats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ChatView>>, ApiError> {
    let chats = db::list_chats_for_user(&state.pool, user.id).await?;

    let mut views = Vec::with_capacity(chats.len());
    for chat in chats {
        views.push(build_view(&state, chat, user.id).await?);
    }
    Ok(Json(views))
}

/// GET /api/chats/{chat_id}
pub async fn get_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<ChatView>, ApiError> {
    let (chat, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Read)?;

    Ok(Json(build_view(&state, chat, user.id).await?))
}

/// POST /api/chats
///
/// A direct chat takes exactly one recipient; anything else must be
/// created as a group.
pub async fn create_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateChatRequest>,
) -> Result<(StatusCode, Json<ChatView>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Chat name is required"));
    }

    let is_group = body.is_group.unwrap_or(false);
    if !is_group && body.recipients.len() != 1 {
        return Err(ApiError::bad_request(
            "A direct chat requires exactly one recipient",
        ));
    }

    // Every recipient must be a known user
    for recipient in &body.recipients {
        if users::db::get_user_by_id(&state.pool, *recipient)
            .await?
            .is_none()
        {
            return Err(ApiError::not_found("Recipient not found"));
        }
    }

    let chat = db::create_chat(&state.pool, user.id, name, is_group, &body.recipients).await?;

    for recipient in body.recipients.iter().filter(|id| **id != user.id) {
        state.realtime.publish(
            Room::User(*recipient),
            RealtimeEvent::new("chat:created", serde_json::to_value(&chat)?),
        );
    }

    let view = build_view(&state, chat, user.id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /api/chats/{chat_id}
pub async fn delete_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (_, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Delete)?;

    // Announce before membership rows disappear
    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new("chat:deleted", serde_json::json!({ "id": chat_id })),
    );

    db::delete_chat(&state.pool, chat_id).await?;

    Ok(Json(serde_json::json!({ "message": "Chat deleted" })))
}

/// POST /api/chats/{chat_id}/users
pub async fn add_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
    Json(body): Json<AddChatUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (chat, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::ManageMembers)?;

    if users::db::get_user_by_id(&state.pool, body.user_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("User not found"));
    }
    if db::get_chat_role(&state.pool, chat_id, body.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("User is already in this chat"));
    }

    db::add_chat_user(&state.pool, chat_id, body.user_id).await?;

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new(
            "chat:user:added",
            serde_json::json!({ "chat_id": chat_id, "user_id": body.user_id }),
        ),
    );
    state.realtime.publish(
        Room::User(body.user_id),
        RealtimeEvent::new("chat:created", serde_json::to_value(&chat)?),
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "message": "User added" })),
    ))
}

/// DELETE /api/chats/{chat_id}/users/{user_id}
///
/// Admins may remove anyone; a member may remove themselves.
pub async fn remove_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, target_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (chat, access) = load_chat_access(&state, chat_id, user.id).await?;

    if target_id != user.id {
        authorize(user.id, Resource::Chat(&access), Action::ManageMembers)?;
    } else if access.role.is_none() {
        return Err(ApiError::not_found("Not a member of this chat"));
    }
    if target_id == chat.owner_id {
        return Err(ApiError::conflict("Cannot remove the chat owner"));
    }

    let removed = db::remove_chat_user(&state.pool, chat_id, target_id).await?;
    if !removed {
        return Err(ApiError::not_found("User is not in this chat"));
    }

    state.realtime.publish(
        Room::Chat(chat_id),
        RealtimeEvent::new(
            "chat:user:removed",
            serde_json::json!({ "chat_id": chat_id, "user_id": target_id }),
        ),
    );

    Ok(Json(serde_json::json!({ "message": "User removed" })))
}

/// PUT /api/chats/{chat_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (_, access) = load_chat_access(&state, chat_id, user.id).await?;
    authorize(user.id, Resource::Chat(&access), Action::Read)?;

    db::mark_read(&state.pool, chat_id, user.id).await?;

    Ok(Json(serde_json::json!({ "message": "Chat marked as read" })))
}
