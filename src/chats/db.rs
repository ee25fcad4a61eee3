//! Database operations for chats, membership, and messages

use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{
    Chat, ChatMemberView, ChatRole, Message, MessageFile, MessageType, MessageView, NewMessageFile,
};
use crate::users::UserSummary;

const CHAT_COLUMNS: &str = "id, name, is_group, owner_id, created_at, updated_at";
const MESSAGE_COLUMNS: &str =
    "id, chat_id, author_id, content, message_type, reply_to, edited, created_at, updated_at";

fn map_chat(row: &sqlx::postgres::PgRow) -> Chat {
    Chat {
        id: row.get("id"),
        name: row.get("name"),
        is_group: row.get("is_group"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_message(row: &sqlx::postgres::PgRow) -> Message {
    Message {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        author_id: row.get("author_id"),
        content: row.get("content"),
        message_type: MessageType::from_str(row.get::<String, _>("message_type").as_str())
            .unwrap_or(MessageType::Text),
        reply_to: row.get("reply_to"),
        edited: row.get("edited"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_message_file(row: &sqlx::postgres::PgRow) -> MessageFile {
    MessageFile {
        id: row.get("id"),
        message_id: row.get("message_id"),
        name: row.get("name"),
        url: row.get("url"),
        size: row.get("size"),
        mime_type: row.get("mime_type"),
        created_at: row.get("created_at"),
    }
}

pub async fn get_chat(pool: &PgPool, chat_id: Uuid) -> Result<Option<Chat>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_chat))
}

/// Role of the user in the chat, None when not a member
pub async fn get_chat_role(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<Option<ChatRole>, sqlx::Error> {
    let row = sqlx::query("SELECT role FROM chat_users WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| {
        let role: String = r.get("role");
        ChatRole::from_str(&role).unwrap_or(ChatRole::Member)
    }))
}

/// Chats the user belongs to, most recently active first
pub async fn list_chats_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Chat>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.is_group, c.owner_id, c.created_at, c.updated_at
        FROM chats c
        JOIN chat_users cu ON cu.chat_id = c.id
        WHERE cu.user_id = $1
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_chat).collect())
}

/// Messages newer than the member's `last_read_at`, own messages excluded
pub async fn count_unread(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total
        FROM messages m
        JOIN chat_users cu ON cu.chat_id = m.chat_id AND cu.user_id = $2
        WHERE m.chat_id = $1
          AND m.author_id <> $2
          AND (cu.last_read_at IS NULL OR m.created_at > cu.last_read_at)
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.get("total"))
}

/// Creates the chat, its admin row for the creator, and member rows for
/// the recipients in one transaction
pub async fn create_chat(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    is_group: bool,
    recipients: &[Uuid],
) -> Result<Chat, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO chats (id, name, is_group, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        RETURNING {CHAT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(is_group)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;
    let chat = map_chat(&row);

    sqlx::query(
        r#"
        INSERT INTO chat_users (id, chat_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, 'admin', NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(chat.id)
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;

    for recipient in recipients.iter().filter(|id| **id != owner_id) {
        sqlx::query(
            r#"
            INSERT INTO chat_users (id, chat_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, 'member', NOW())
            ON CONFLICT (chat_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chat.id)
        .bind(recipient)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(chat)
}

/// Deletes the chat with its message files, messages, and memberships
pub async fn delete_chat(pool: &PgPool, chat_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM message_files
        USING messages
        WHERE message_files.message_id = messages.id AND messages.chat_id = $1
        "#,
    )
    .bind(chat_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM messages WHERE chat_id = $1")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chat_users WHERE chat_id = $1")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM chats WHERE id = $1")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn list_chat_members(
    pool: &PgPool,
    chat_id: Uuid,
) -> Result<Vec<ChatMemberView>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT cu.user_id, cu.role, cu.last_read_at, cu.joined_at,
               u.name, u.email, u.avatar
        FROM chat_users cu
        JOIN users u ON u.id = cu.user_id
        WHERE cu.chat_id = $1
        ORDER BY cu.joined_at ASC
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| {
            let role: String = row.get("role");
            ChatMemberView {
                user: UserSummary {
                    id: row.get("user_id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    avatar: row.get("avatar"),
                },
                role: ChatRole::from_str(&role).unwrap_or(ChatRole::Member),
                last_read_at: row.get("last_read_at"),
                joined_at: row.get("joined_at"),
            }
        })
        .collect())
}

pub async fn add_chat_user(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO chat_users (id, chat_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, 'member', NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(chat_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove_chat_user(
    pool: &PgPool,
    chat_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM chat_users WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Bumps the member's read marker to now
pub async fn mark_read(pool: &PgPool, chat_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chat_users SET last_read_at = NOW() WHERE chat_id = $1 AND user_id = $2")
        .bind(chat_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_message(pool: &PgPool, message_id: Uuid) -> Result<Option<Message>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
    ))
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_message))
}

/// Messages of a chat oldest first, with authors and attachments
pub async fn list_messages(
    pool: &PgPool,
    chat_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<MessageView>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.chat_id, m.author_id, m.content, m.message_type, m.reply_to,
               m.edited, m.created_at, m.updated_at,
               u.name AS author_name, u.email AS author_email, u.avatar AS author_avatar
        FROM messages m
        JOIN users u ON u.id = m.author_id
        WHERE m.chat_id = $1
        ORDER BY m.created_at ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(chat_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let file_rows = sqlx::query(
        r#"
        SELECT mf.id, mf.message_id, mf.name, mf.url, mf.size, mf.mime_type, mf.created_at
        FROM message_files mf
        JOIN messages m ON m.id = mf.message_id
        WHERE m.chat_id = $1
        ORDER BY mf.created_at ASC
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await?;

    let mut files: std::collections::HashMap<Uuid, Vec<MessageFile>> =
        std::collections::HashMap::new();
    for row in &file_rows {
        let file = map_message_file(row);
        files.entry(file.message_id).or_default().push(file);
    }

    Ok(rows
        .iter()
        .map(|row| {
            let message = map_message(row);
            MessageView {
                author: UserSummary {
                    id: message.author_id,
                    name: row.get("author_name"),
                    email: row.get("author_email"),
                    avatar: row.get("author_avatar"),
                },
                files: files.remove(&message.id).unwrap_or_default(),
                message,
            }
        })
        .collect())
}

/// Inserts a message and bumps the chat's activity timestamp
pub async fn create_message(
    pool: &PgPool,
    chat_id: Uuid,
    author_id: Uuid,
    content: &str,
    message_type: MessageType,
    reply_to: Option<Uuid>,
    files: &[NewMessageFile],
) -> Result<Message, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO messages (id, chat_id, author_id, content, message_type, reply_to,
                              edited, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW(), NOW())
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(chat_id)
    .bind(author_id)
    .bind(content)
    .bind(message_type.as_str())
    .bind(reply_to)
    .fetch_one(&mut *tx)
    .await?;
    let message = map_message(&row);

    for file in files {
        sqlx::query(
            r#"
            INSERT INTO message_files (id, message_id, name, url, size, mime_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.id)
        .bind(&file.name)
        .bind(&file.url)
        .bind(file.size)
        .bind(&file.mime_type)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(message)
}

pub async fn update_message(
    pool: &PgPool,
    message_id: Uuid,
    content: &str,
) -> Result<Message, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE messages
        SET content = $2, edited = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(message_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(map_message(&row))
}

pub async fn delete_message(pool: &PgPool, message_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM message_files WHERE message_id = $1")
        .bind(message_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(message_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_message_file(
    pool: &PgPool,
    file_id: Uuid,
) -> Result<Option<MessageFile>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, message_id, name, url, size, mime_type, created_at
        FROM message_files
        WHERE id = $1
        "#,
    )
    .bind(file_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_message_file))
}

/// Attaches an uploaded file to an existing message
pub async fn create_message_file(
    pool: &PgPool,
    message_id: Uuid,
    name: &str,
    url: &str,
    size: i64,
    mime_type: &str,
) -> Result<MessageFile, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO message_files (id, message_id, name, url, size, mime_type, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        RETURNING id, message_id, name, url, size, mime_type, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(message_id)
    .bind(name)
    .bind(url)
    .bind(size)
    .bind(mime_type)
    .fetch_one(pool)
    .await?;

    Ok(map_message_file(&row))
}

pub async fn delete_message_file(pool: &PgPool, file_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM message_files WHERE id = $1")
        .bind(file_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_message_files(
    pool: &PgPool,
    message_id: Uuid,
) -> Result<Vec<MessageFile>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, message_id, name, url, size, mime_type, created_at
        FROM message_files
        WHERE message_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(message_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_message_file).collect())
}
