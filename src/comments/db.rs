//! Database operations for comments and their reactions

use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Comment, CommentView, ReactionMap};
use crate::users::UserSummary;

const COMMENT_COLUMNS: &str =
    "id, task_id, author_id, parent_id, text, edited, created_at, updated_at";

fn map_comment(row: &sqlx::postgres::PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        task_id: row.get("task_id"),
        author_id: row.get("author_id"),
        parent_id: row.get("parent_id"),
        text: row.get("text"),
        edited: row.get("edited"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_comment(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_comment))
}

/// Loads the full comment tree of a task: top-level comments newest
/// first, each with its replies oldest first, authors and reactions
/// attached.
pub async fn list_comment_tree(
    pool: &PgPool,
    task_id: Uuid,
) -> Result<Vec<CommentView>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.task_id, c.author_id, c.parent_id, c.text, c.edited,
               c.created_at, c.updated_at,
               u.name AS author_name, u.email AS author_email, u.avatar AS author_avatar
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.task_id = $1
        ORDER BY c.created_at ASC
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    let reaction_rows = sqlx::query(
        r#"
        SELECT cr.comment_id, cr.user_id, cr.reaction
        FROM comment_reactions cr
        JOIN comments c ON c.id = cr.comment_id
        WHERE c.task_id = $1
        ORDER BY cr.created_at ASC
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    let mut reactions: std::collections::HashMap<Uuid, ReactionMap> =
        std::collections::HashMap::new();
    for row in &reaction_rows {
        let comment_id: Uuid = row.get("comment_id");
        let reaction: String = row.get("reaction");
        let user_id: Uuid = row.get("user_id");
        reactions
            .entry(comment_id)
            .or_default()
            .entry(reaction)
            .or_default()
            .push(user_id);
    }

    let mut views: Vec<CommentView> = Vec::new();
    let mut replies: Vec<CommentView> = Vec::new();
    for row in &rows {
        let comment = map_comment(row);
        let view = CommentView {
            reactions: reactions.remove(&comment.id).unwrap_or_default(),
            author: UserSummary {
                id: comment.author_id,
                name: row.get("author_name"),
                email: row.get("author_email"),
                avatar: row.get("author_avatar"),
            },
            replies: Vec::new(),
            comment,
        };
        if view.comment.parent_id.is_some() {
            replies.push(view);
        } else {
            views.push(view);
        }
    }

    // Replies arrive in ASC order; attach each to its parent in turn
    for reply in replies {
        let parent_id = reply.comment.parent_id;
        if let Some(parent) = views.iter_mut().find(|v| Some(v.comment.id) == parent_id) {
            parent.replies.push(reply);
        }
    }

    // Top-level newest first
    views.reverse();
    Ok(views)
}

pub async fn create_comment(
    pool: &PgPool,
    task_id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO comments (id, task_id, author_id, parent_id, text, edited, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, NOW(), NOW())
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(text)
    .fetch_one(pool)
    .await?;

    Ok(map_comment(&row))
}

/// Edits mark the comment as edited permanently
pub async fn update_comment(
    pool: &PgPool,
    comment_id: Uuid,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE comments
        SET text = $2, edited = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(comment_id)
    .bind(text)
    .fetch_one(pool)
    .await?;

    Ok(map_comment(&row))
}

/// Deletes a comment, its replies, and all attached reactions
pub async fn delete_comment_tree(pool: &PgPool, comment_id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM comment_reactions
        WHERE comment_id = $1
           OR comment_id IN (SELECT id FROM comments WHERE parent_id = $1)
        "#,
    )
    .bind(comment_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM comments WHERE parent_id = $1")
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Inserts one reaction row; the unique index rejects duplicates
pub async fn add_reaction(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
    reaction: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comment_reactions (id, comment_id, user_id, reaction, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(comment_id)
    .bind(user_id)
    .bind(reaction)
    .execute(pool)
    .await?;

    Ok(())
}

/// Removes a reaction row; returns false when there was nothing to remove
pub async fn remove_reaction(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
    reaction: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM comment_reactions WHERE comment_id = $1 AND user_id = $2 AND reaction = $3",
    )
    .bind(comment_id)
    .bind(user_id)
    .bind(reaction)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Renders a single comment's reactions as the response map shape
pub async fn get_reaction_map(pool: &PgPool, comment_id: Uuid) -> Result<ReactionMap, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT user_id, reaction
        FROM comment_reactions
        WHERE comment_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(comment_id)
    .fetch_all(pool)
    .await?;

    let mut map = ReactionMap::new();
    for row in &rows {
        let reaction: String = row.get("reaction");
        let user_id: Uuid = row.get("user_id");
        map.entry(reaction).or_default().push(user_id);
    }
    Ok(map)
}

pub async fn has_reaction(
    pool: &PgPool,
    comment_id: Uuid,
    user_id: Uuid,
    reaction: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT 1 AS present
        FROM comment_reactions
        WHERE comment_id = $1 AND user_id = $2 AND reaction = $3
        "#,
    )
    .bind(comment_id)
    .bind(user_id)
    .bind(reaction)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}
