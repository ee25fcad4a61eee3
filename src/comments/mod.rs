/**
 * Comments and Reactions
 *
 * Comments hang off a task and form a one-level tree: top-level comments
 * carry replies, replies carry none. Reactions are stored one row per
 * (comment, user, reaction) and rendered back into a
 * `{reaction: [user_id, ...]}` map in responses.
 */

pub mod db;
pub mod handlers;
pub mod reactions;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::users::UserSummary;

/// Map from reaction name to the users who reacted with it
pub type ReactionMap = BTreeMap<String, Vec<Uuid>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub text: String,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with author, reactions, and nested replies
#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: UserSummary,
    pub reactions: ReactionMap,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub reaction: String,
}
