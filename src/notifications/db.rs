//! Database operations for notifications

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::Notification;

fn map_notification(row: &sqlx::postgres::PgRow) -> Notification {
    Notification {
        id: row.get("id"),
        recipient_id: row.get("recipient_id"),
        kind: row.get("kind"),
        title: row.get("title"),
        message: row.get("message"),
        payload: row.get("payload"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

pub async fn create_notification(
    pool: &PgPool,
    recipient_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    payload: &serde_json::Value,
) -> Result<Notification, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient_id, kind, title, message, payload, read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        RETURNING id, recipient_id, kind, title, message, payload, read, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(payload)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(map_notification(&row))
}

pub async fn get_notification(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, recipient_id, kind, title, message, payload, read, created_at
        FROM notifications
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_notification))
}

pub async fn list_notifications(
    pool: &PgPool,
    recipient_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, recipient_id, kind, title, message, payload, read, created_at
        FROM notifications
        WHERE recipient_id = $1 AND (NOT $2 OR read = FALSE)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(recipient_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_notification).collect())
}

pub async fn count_notifications(
    pool: &PgPool,
    recipient_id: Uuid,
    unread_only: bool,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total
        FROM notifications
        WHERE recipient_id = $1 AND (NOT $2 OR read = FALSE)
        "#,
    )
    .bind(recipient_id)
    .bind(unread_only)
    .fetch_one(pool)
    .await?;

    Ok(row.get("total"))
}

pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Notification, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE notifications
        SET read = TRUE
        WHERE id = $1
        RETURNING id, recipient_id, kind, title, message, payload, read, created_at
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(map_notification(&row))
}

pub async fn mark_all_read(pool: &PgPool, recipient_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET read = TRUE
        WHERE recipient_id = $1 AND read = FALSE
        "#,
    )
    .bind(recipient_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_notification(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM notifications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
