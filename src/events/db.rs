//! Database operations for calendar events

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Event, Occurrence};

const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, all_day, location, color, \
                             event_type, recurrence, owner_id, team_id, task_id, \
                             parent_event_id, is_exception, created_at, updated_at";

fn map_event(row: &sqlx::postgres::PgRow) -> Event {
    Event {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        start_at: row.get("start_at"),
        end_at: row.get("end_at"),
        all_day: row.get("all_day"),
        location: row.get("location"),
        color: row.get("color"),
        event_type: row.get("event_type"),
        recurrence: row.get("recurrence"),
        owner_id: row.get("owner_id"),
        team_id: row.get("team_id"),
        task_id: row.get("task_id"),
        parent_event_id: row.get("parent_event_id"),
        is_exception: row.get("is_exception"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_event(pool: &PgPool, event_id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(event_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_event))
}

/// Events visible to the user (own or of teams they belong to), with
/// optional team/type filters and a time-window overlap filter
pub async fn list_events(
    pool: &PgPool,
    user_id: Uuid,
    team_id: Option<Uuid>,
    event_type: Option<&str>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Vec<Event>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT e.id, e.title, e.description, e.start_at, e.end_at, e.all_day,
               e.location, e.color, e.event_type, e.recurrence, e.owner_id, e.team_id,
               e.task_id, e.parent_event_id, e.is_exception, e.created_at, e.updated_at
        FROM events e
        LEFT JOIN team_members tm ON tm.team_id = e.team_id
        WHERE (e.owner_id = $1 OR tm.user_id = $1)
          AND ($2::uuid IS NULL OR e.team_id = $2)
          AND ($3::text IS NULL OR e.event_type = $3)
          AND ($4::timestamptz IS NULL OR e.end_at >= $4)
          AND ($5::timestamptz IS NULL OR e.start_at <= $5)
        ORDER BY e.start_at ASC
        "#,
    )
    .bind(user_id)
    .bind(team_id)
    .bind(event_type)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_event).collect())
}

#[allow(clippy::too_many_arguments)]
pub async fn create_event(
    pool: &PgPool,
    owner_id: Uuid,
    title: &str,
    description: Option<&str>,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    all_day: bool,
    location: Option<&str>,
    color: Option<&str>,
    event_type: Option<&str>,
    recurrence: Option<&serde_json::Value>,
    team_id: Option<Uuid>,
    task_id: Option<Uuid>,
) -> Result<Event, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO events (id, title, description, start_at, end_at, all_day, location,
                            color, event_type, recurrence, owner_id, team_id, task_id,
                            parent_event_id, is_exception, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NULL, FALSE, NOW(), NOW())
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(start_at)
    .bind(end_at)
    .bind(all_day)
    .bind(location)
    .bind(color)
    .bind(event_type)
    .bind(recurrence)
    .bind(owner_id)
    .bind(team_id)
    .bind(task_id)
    .fetch_one(pool)
    .await?;

    Ok(map_event(&row))
}

/// Inserts the expanded occurrences of a series in one transaction.
///
/// Children copy the parent's fields, clear the rule, and point back at
/// the parent.
pub async fn insert_occurrences(
    pool: &PgPool,
    parent: &Event,
    occurrences: &[Occurrence],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for occ in occurrences {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, start_at, end_at, all_day, location,
                                color, event_type, recurrence, owner_id, team_id, task_id,
                                parent_event_id, is_exception, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL, $10, $11, $12, $13, FALSE, NOW(), NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&parent.title)
        .bind(&parent.description)
        .bind(occ.start_at)
        .bind(occ.end_at)
        .bind(parent.all_day)
        .bind(&parent.location)
        .bind(&parent.color)
        .bind(&parent.event_type)
        .bind(parent.owner_id)
        .bind(parent.team_id)
        .bind(parent.task_id)
        .bind(parent.id)
        .execute(&mut *tx)
        .await?;
        inserted += 1;
    }

    tx.commit().await?;
    Ok(inserted)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_event(
    pool: &PgPool,
    event_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    all_day: Option<bool>,
    location: Option<&str>,
    color: Option<&str>,
    event_type: Option<&str>,
) -> Result<Event, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE events
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            start_at = COALESCE($4, start_at),
            end_at = COALESCE($5, end_at),
            all_day = COALESCE($6, all_day),
            location = COALESCE($7, location),
            color = COALESCE($8, color),
            event_type = COALESCE($9, event_type),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(event_id)
    .bind(title)
    .bind(description)
    .bind(start_at)
    .bind(end_at)
    .bind(all_day)
    .bind(location)
    .bind(color)
    .bind(event_type)
    .fetch_one(pool)
    .await?;

    Ok(map_event(&row))
}

/// Marks one occurrence as an exception to its series
pub async fn mark_exception(pool: &PgPool, event_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE events SET is_exception = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Applies field edits to every non-exception future occurrence of the
/// series (start at or after `from`), plus the parent itself
#[allow(clippy::too_many_arguments)]
pub async fn update_future_occurrences(
    pool: &PgPool,
    parent_id: Uuid,
    from: DateTime<Utc>,
    title: Option<&str>,
    description: Option<&str>,
    all_day: Option<bool>,
    location: Option<&str>,
    color: Option<&str>,
    event_type: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET title = COALESCE($3, title),
            description = COALESCE($4, description),
            all_day = COALESCE($5, all_day),
            location = COALESCE($6, location),
            color = COALESCE($7, color),
            event_type = COALESCE($8, event_type),
            updated_at = NOW()
        WHERE (id = $1 OR parent_event_id = $1)
          AND is_exception = FALSE
          AND start_at >= $2
        "#,
    )
    .bind(parent_id)
    .bind(from)
    .bind(title)
    .bind(description)
    .bind(all_day)
    .bind(location)
    .bind(color)
    .bind(event_type)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_event(pool: &PgPool, event_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes a series parent and every child occurrence
pub async fn delete_series(pool: &PgPool, parent_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1 OR parent_event_id = $1")
        .bind(parent_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
