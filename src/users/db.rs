//! Database operations for user accounts

use chrono::Utc;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{User, UserRole, UserStatus, UserSummary};

fn map_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        external_id: row.get("external_id"),
        email: row.get("email"),
        name: row.get("name"),
        avatar: row.get("avatar"),
        role: UserRole::from_str(row.get::<String, _>("role").as_str()).unwrap_or(UserRole::User),
        status: UserStatus::from_str(row.get::<String, _>("status").as_str())
            .unwrap_or(UserStatus::Active),
        preferences: row.get("preferences"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str =
    "id, external_id, email, name, avatar, role, status, preferences, created_at, updated_at";

pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_user))
}

pub async fn get_user_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_user))
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
    ))
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(map_user))
}

/// Create a local user for a freshly seen external identity
pub async fn create_user(
    pool: &PgPool,
    external_id: &str,
    email: &str,
    name: &str,
    avatar: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO users (id, external_id, email, name, avatar, role, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'user', 'active', $6, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(external_id)
    .bind(email)
    .bind(name)
    .bind(avatar)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(map_user(&row))
}

pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    avatar: Option<&str>,
    preferences: Option<&serde_json::Value>,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            avatar = COALESCE($3, avatar),
            preferences = COALESCE($4, preferences),
            updated_at = $5
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(name)
    .bind(avatar)
    .bind(preferences)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(map_user(&row))
}

pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    status: UserStatus,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE users
        SET status = $2, updated_at = $3
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(map_user(&row))
}

/// Escapes LIKE metacharacters so a search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive substring search over names and emails
pub async fn search_users(
    pool: &PgPool,
    term: &str,
    limit: i64,
) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, email, avatar
        FROM users
        WHERE name ILIKE $1 OR email ILIKE $1
        ORDER BY name ASC
        LIMIT $2
        "#,
    )
    .bind(like_pattern(term))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            avatar: row.get("avatar"),
        })
        .collect())
}

/// Load compact summaries for a set of users, e.g. task assignees
pub async fn get_user_summaries(
    pool: &PgPool,
    ids: &[Uuid],
) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, email, avatar
        FROM users
        WHERE id = ANY($1)
        ORDER BY name ASC
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            avatar: row.get("avatar"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
