//! Database operations for the activity log
//!
//! The table is append-only; there are no update or delete paths here.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::ActivityEntry;

fn map_entry(row: &sqlx::postgres::PgRow) -> ActivityEntry {
    ActivityEntry {
        id: row.get("id"),
        actor_id: row.get("actor_id"),
        team_id: row.get("team_id"),
        action: row.get("action"),
        details: row.get("details"),
        created_at: row.get("created_at"),
    }
}

pub async fn append_entry(
    pool: &PgPool,
    actor_id: Uuid,
    team_id: Option<Uuid>,
    action: &str,
    details: &serde_json::Value,
) -> Result<ActivityEntry, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO activity_log (id, actor_id, team_id, action, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, actor_id, team_id, action, details, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor_id)
    .bind(team_id)
    .bind(action)
    .bind(details)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(map_entry(&row))
}

#[allow(clippy::too_many_arguments)]
pub async fn list_user_entries(
    pool: &PgPool,
    actor_id: Uuid,
    action: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, actor_id, team_id, action, details, created_at
        FROM activity_log
        WHERE actor_id = $1
          AND ($2::text IS NULL OR action = $2)
          AND ($3::timestamptz IS NULL OR created_at >= $3)
          AND ($4::timestamptz IS NULL OR created_at <= $4)
        ORDER BY created_at DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(actor_id)
    .bind(action)
    .bind(from)
    .bind(to)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_entry).collect())
}

pub async fn count_user_entries(
    pool: &PgPool,
    actor_id: Uuid,
    action: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total
        FROM activity_log
        WHERE actor_id = $1
          AND ($2::text IS NULL OR action = $2)
          AND ($3::timestamptz IS NULL OR created_at >= $3)
          AND ($4::timestamptz IS NULL OR created_at <= $4)
        "#,
    )
    .bind(actor_id)
    .bind(action)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await?;

    Ok(row.get("total"))
}

pub async fn count_team_entries(pool: &PgPool, team_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS total FROM activity_log WHERE team_id = $1")
        .bind(team_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("total"))
}

pub async fn list_team_entries(
    pool: &PgPool,
    team_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, actor_id, team_id, action, details, created_at
        FROM activity_log
        WHERE team_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(team_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_entry).collect())
}
