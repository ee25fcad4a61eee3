//! Database operations for tasks and assignees

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{Task, TaskPriority, TaskStatus};

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, sort_order, \
                            creator_id, team_id, created_at, updated_at";

fn map_task(row: &sqlx::postgres::PgRow) -> Task {
    Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: TaskStatus::from_str(row.get::<String, _>("status").as_str())
            .unwrap_or(TaskStatus::Todo),
        priority: TaskPriority::from_str(row.get::<String, _>("priority").as_str())
            .unwrap_or(TaskPriority::Medium),
        due_date: row.get("due_date"),
        sort_order: row.get("sort_order"),
        creator_id: row.get("creator_id"),
        team_id: row.get("team_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn get_task(pool: &PgPool, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_task))
}

/// Personal tasks plus tasks of every team the user belongs to
pub async fn list_tasks_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT t.id, t.title, t.description, t.status, t.priority, t.due_date,
               t.sort_order, t.creator_id, t.team_id, t.created_at, t.updated_at
        FROM tasks t
        LEFT JOIN team_members tm ON tm.team_id = t.team_id
        WHERE t.creator_id = $1 OR tm.user_id = $1
        ORDER BY t.sort_order ASC, t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_task).collect())
}

#[allow(clippy::too_many_arguments)]
pub async fn create_task(
    pool: &PgPool,
    creator_id: Uuid,
    title: &str,
    description: Option<&str>,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    team_id: Option<Uuid>,
    assignees: &[Uuid],
) -> Result<Task, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO tasks (id, title, description, status, priority, due_date,
                           sort_order, creator_id, team_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, NOW(), NOW())
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(status.as_str())
    .bind(priority.as_str())
    .bind(due_date)
    .bind(creator_id)
    .bind(team_id)
    .fetch_one(&mut *tx)
    .await?;
    let task = map_task(&row);

    for user_id in assignees {
        sqlx::query(
            r#"
            INSERT INTO task_assignees (id, task_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(task)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_task(
    pool: &PgPool,
    task_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: Option<DateTime<Utc>>,
) -> Result<Task, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE tasks
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            status = COALESCE($4, status),
            priority = COALESCE($5, priority),
            due_date = COALESCE($6, due_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(task_id)
    .bind(title)
    .bind(description)
    .bind(status.map(|s| s.as_str()))
    .bind(priority.map(|p| p.as_str()))
    .bind(due_date)
    .fetch_one(pool)
    .await?;

    Ok(map_task(&row))
}

pub async fn update_status(
    pool: &PgPool,
    task_id: Uuid,
    status: TaskStatus,
) -> Result<Task, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE tasks
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(task_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;

    Ok(map_task(&row))
}

pub async fn update_sort_order(
    pool: &PgPool,
    task_id: Uuid,
    sort_order: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tasks SET sort_order = $2, updated_at = NOW() WHERE id = $1")
        .bind(task_id)
        .bind(sort_order)
        .execute(pool)
        .await?;

    Ok(())
}

/// Replaces the assignee set wholesale
pub async fn set_assignees(
    pool: &PgPool,
    task_id: Uuid,
    assignees: &[Uuid],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    for user_id in assignees {
        sqlx::query(
            r#"
            INSERT INTO task_assignees (id, task_id, user_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_assignee_ids(pool: &PgPool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query("SELECT user_id FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|r| r.get("user_id")).collect())
}

/// Deletes a task and all dependents in one transaction.
///
/// Returns the disk paths of attached files so the caller can remove
/// them after the rows are gone.
pub async fn delete_task_cascade(pool: &PgPool, task_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let paths: Vec<String> = sqlx::query("SELECT path FROM files WHERE task_id = $1")
        .bind(task_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|r| r.get("path"))
        .collect();

    sqlx::query(
        r#"
        DELETE FROM comment_reactions
        USING comments
        WHERE comment_reactions.comment_id = comments.id AND comments.task_id = $1
        "#,
    )
    .bind(task_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM comments WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM subtasks WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM files WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(paths)
}
