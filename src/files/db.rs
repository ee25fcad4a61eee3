//! Database operations for file metadata

use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::StoredFile;

const FILE_COLUMNS: &str = "id, task_id, owner_id, name, path, size, mime_type, created_at";

fn map_file(row: &sqlx::postgres::PgRow) -> StoredFile {
    StoredFile {
        id: row.get("id"),
        task_id: row.get("task_id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        path: row.get("path"),
        size: row.get("size"),
        mime_type: row.get("mime_type"),
        created_at: row.get("created_at"),
    }
}

pub async fn get_file(pool: &PgPool, file_id: Uuid) -> Result<Option<StoredFile>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1"))
        .bind(file_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_file))
}

pub async fn list_files_for_task(
    pool: &PgPool,
    task_id: Uuid,
) -> Result<Vec<StoredFile>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {FILE_COLUMNS}
        FROM files
        WHERE task_id = $1
        ORDER BY created_at ASC
        "#
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_file).collect())
}

pub async fn create_file(
    pool: &PgPool,
    task_id: Uuid,
    owner_id: Uuid,
    name: &str,
    path: &str,
    size: i64,
    mime_type: &str,
) -> Result<StoredFile, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO files (id, task_id, owner_id, name, path, size, mime_type, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING {FILE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(owner_id)
    .bind(name)
    .bind(path)
    .bind(size)
    .bind(mime_type)
    .fetch_one(pool)
    .await?;

    Ok(map_file(&row))
}

pub async fn delete_file(pool: &PgPool, file_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM files WHERE id = $1")
        .bind(file_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
