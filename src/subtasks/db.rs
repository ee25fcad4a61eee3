//! Database operations for subtasks

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::Subtask;

const SUBTASK_COLUMNS: &str =
    "id, task_id, title, description, completed, progress, sort_order, \
     creator_id, assigned_to, due_date, dependencies, created_at, updated_at";

fn map_subtask(row: &sqlx::postgres::PgRow) -> Subtask {
    Subtask {
        id: row.get("id"),
        task_id: row.get("task_id"),
        title: row.get("title"),
        description: row.get("description"),
        completed: row.get("completed"),
        progress: row.get("progress"),
        sort_order: row.get("sort_order"),
        creator_id: row.get("creator_id"),
        assigned_to: row.get("assigned_to"),
        due_date: row.get("due_date"),
        dependencies: row.get("dependencies"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_subtask(pool: &PgPool, subtask_id: Uuid) -> Result<Option<Subtask>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE id = $1"
    ))
    .bind(subtask_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_subtask))
}

pub async fn list_subtasks(pool: &PgPool, task_id: Uuid) -> Result<Vec<Subtask>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {SUBTASK_COLUMNS}
        FROM subtasks
        WHERE task_id = $1
        ORDER BY sort_order ASC, created_at ASC
        "#
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_subtask).collect())
}

#[allow(clippy::too_many_arguments)]
pub async fn create_subtask(
    pool: &PgPool,
    task_id: Uuid,
    creator_id: Uuid,
    title: &str,
    description: Option<&str>,
    sort_order: i32,
    assigned_to: Option<Uuid>,
    due_date: Option<DateTime<Utc>>,
) -> Result<Subtask, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO subtasks (id, task_id, title, description, completed, progress, sort_order,
                              creator_id, assigned_to, due_date, dependencies, created_at, updated_at)
        VALUES ($1, $2, $3, $4, FALSE, 0, $5, $6, $7, $8, '{{}}', NOW(), NOW())
        RETURNING {SUBTASK_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(title)
    .bind(description)
    .bind(sort_order)
    .bind(creator_id)
    .bind(assigned_to)
    .bind(due_date)
    .fetch_one(pool)
    .await?;

    Ok(map_subtask(&row))
}

/// Partial update; `assigned_to` uses an outer Option so an explicit
/// `Some(None)` clears the assignee while `None` leaves it untouched.
#[allow(clippy::too_many_arguments)]
pub async fn update_subtask(
    pool: &PgPool,
    subtask_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    completed: Option<bool>,
    progress: Option<i32>,
    sort_order: Option<i32>,
    assigned_to: Option<Option<Uuid>>,
    due_date: Option<DateTime<Utc>>,
) -> Result<Subtask, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE subtasks
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            completed = COALESCE($4, completed),
            progress = COALESCE($5, progress),
            sort_order = COALESCE($6, sort_order),
            assigned_to = CASE WHEN $7 THEN $8 ELSE assigned_to END,
            due_date = COALESCE($9, due_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SUBTASK_COLUMNS}
        "#
    ))
    .bind(subtask_id)
    .bind(title)
    .bind(description)
    .bind(completed)
    .bind(progress)
    .bind(sort_order)
    .bind(assigned_to.is_some())
    .bind(assigned_to.flatten())
    .bind(due_date)
    .fetch_one(pool)
    .await?;

    Ok(map_subtask(&row))
}

pub async fn update_progress(
    pool: &PgPool,
    subtask_id: Uuid,
    progress: i32,
) -> Result<Subtask, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE subtasks
        SET progress = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SUBTASK_COLUMNS}
        "#
    ))
    .bind(subtask_id)
    .bind(progress)
    .fetch_one(pool)
    .await?;

    Ok(map_subtask(&row))
}

/// Appends the dependency unless it is already present
pub async fn add_dependency(
    pool: &PgPool,
    subtask_id: Uuid,
    dependency_id: Uuid,
) -> Result<Subtask, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE subtasks
        SET dependencies = CASE
                WHEN $2 = ANY(dependencies) THEN dependencies
                ELSE array_append(dependencies, $2)
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SUBTASK_COLUMNS}
        "#
    ))
    .bind(subtask_id)
    .bind(dependency_id)
    .fetch_one(pool)
    .await?;

    Ok(map_subtask(&row))
}

/// Removes the dependency; a no-op when it was not listed
pub async fn remove_dependency(
    pool: &PgPool,
    subtask_id: Uuid,
    dependency_id: Uuid,
) -> Result<Subtask, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE subtasks
        SET dependencies = array_remove(dependencies, $2),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SUBTASK_COLUMNS}
        "#
    ))
    .bind(subtask_id)
    .bind(dependency_id)
    .fetch_one(pool)
    .await?;

    Ok(map_subtask(&row))
}

pub async fn delete_subtask(pool: &PgPool, subtask_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subtasks WHERE id = $1")
        .bind(subtask_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
