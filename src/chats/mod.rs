/**
 * Chats and Messages
 *
 * Direct and group conversations. The creator becomes chat admin;
 * per-member `last_read_at` drives unread counts. Messages may reply to
 * another message and carry file metadata rows.
 */

pub mod db;
pub mod handlers;
pub mod messages;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::users::UserSummary;

/// Role of a user inside one chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    Member,
    Admin,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown chat role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    File,
    Image,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "file" => Ok(Self::File),
            "image" => Ok(Self::Image),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub name: String,
    pub is_group: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMemberView {
    pub user: UserSummary,
    pub role: ChatRole,
    pub last_read_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

/// Chat with members and the caller's unread count
#[derive(Debug, Serialize)]
pub struct ChatView {
    #[serde(flatten)]
    pub chat: Chat,
    pub members: Vec<ChatMemberView>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub reply_to: Option<Uuid>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageFile {
    pub id: Uuid,
    pub message_id: Uuid,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

/// Message with author and attachments
#[derive(Debug, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub author: UserSummary,
    pub files: Vec<MessageFile>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
    pub is_group: Option<bool>,
    /// User ids added as members; a direct chat takes exactly one
    pub recipients: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddChatUserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct NewMessageFile {
    pub name: String,
    pub url: String,
    pub size: i64,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub message_type: Option<MessageType>,
    pub reply_to: Option<Uuid>,
    pub files: Option<Vec<NewMessageFile>>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_round_trip() {
        for mt in [MessageType::Text, MessageType::File, MessageType::Image] {
            assert_eq!(mt.as_str().parse::<MessageType>().unwrap(), mt);
        }
        assert!("video".parse::<MessageType>().is_err());
    }
}
