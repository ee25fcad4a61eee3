//! Database operations for teams and team membership

use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{MemberView, Team, TeamRole};
use crate::users::UserSummary;

const TEAM_COLUMNS: &str =
    "id, name, description, avatar, owner_id, settings, created_at, updated_at";

fn map_team(row: &sqlx::postgres::PgRow) -> Team {
    Team {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        avatar: row.get("avatar"),
        owner_id: row.get("owner_id"),
        settings: row.get("settings"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_member(row: &sqlx::postgres::PgRow) -> MemberView {
    let role: String = row.get("role");
    MemberView {
        user: UserSummary {
            id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            avatar: row.get("avatar"),
        },
        role: TeamRole::from_str(&role).unwrap_or(TeamRole::Member),
        joined_at: row.get("joined_at"),
    }
}

pub async fn get_team(pool: &PgPool, team_id: Uuid) -> Result<Option<Team>, sqlx::Error> {
    let row = sqlx::query(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
        .bind(team_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(map_team))
}

/// Teams the user owns or belongs to, newest first
pub async fn list_teams_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Team>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT t.id, t.name, t.description, t.avatar, t.owner_id,
               t.settings, t.created_at, t.updated_at
        FROM teams t
        LEFT JOIN team_members tm ON tm.team_id = t.id
        WHERE t.owner_id = $1 OR tm.user_id = $1
        ORDER BY t.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_team).collect())
}

/// Creates the team and its owner membership row in one transaction
pub async fn create_team(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
    avatar: Option<&str>,
    settings: &serde_json::Value,
) -> Result<Team, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        r#"
        INSERT INTO teams (id, name, description, avatar, owner_id, settings, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        RETURNING {TEAM_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .bind(avatar)
    .bind(owner_id)
    .bind(settings)
    .fetch_one(&mut *tx)
    .await?;
    let team = map_team(&row);

    sqlx::query(
        r#"
        INSERT INTO team_members (id, team_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, 'owner', NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(team.id)
    .bind(owner_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(team)
}

pub async fn update_team(
    pool: &PgPool,
    team_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
    avatar: Option<&str>,
    settings: Option<&serde_json::Value>,
) -> Result<Team, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE teams
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            avatar = COALESCE($4, avatar),
            settings = COALESCE($5, settings),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {TEAM_COLUMNS}
        "#
    ))
    .bind(team_id)
    .bind(name)
    .bind(description)
    .bind(avatar)
    .bind(settings)
    .fetch_one(pool)
    .await?;

    Ok(map_team(&row))
}

pub async fn update_settings(
    pool: &PgPool,
    team_id: Uuid,
    settings: &serde_json::Value,
) -> Result<Team, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        UPDATE teams
        SET settings = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {TEAM_COLUMNS}
        "#
    ))
    .bind(team_id)
    .bind(settings)
    .fetch_one(pool)
    .await?;

    Ok(map_team(&row))
}

/// Deletes the team's tasks, memberships, then the team itself.
/// Returns the disk paths of the tasks' file attachments so the caller
/// can unlink them after the commit.
pub async fn delete_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let paths: Vec<String> = sqlx::query(
        r#"
        SELECT f.path
        FROM files f
        JOIN tasks t ON t.id = f.task_id
        WHERE t.team_id = $1
        "#,
    )
    .bind(team_id)
    .fetch_all(&mut *tx)
    .await?
    .iter()
    .map(|r| r.get("path"))
    .collect();

    sqlx::query("DELETE FROM tasks WHERE team_id = $1")
        .bind(team_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM team_members WHERE team_id = $1")
        .bind(team_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM teams WHERE id = $1")
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(paths)
}

/// Role of the user in the team, None when not a member
pub async fn get_member_role(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<Option<TeamRole>, sqlx::Error> {
    let row = sqlx::query("SELECT role FROM team_members WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| {
        let role: String = r.get("role");
        TeamRole::from_str(&role).unwrap_or(TeamRole::Member)
    }))
}

pub async fn list_members(pool: &PgPool, team_id: Uuid) -> Result<Vec<MemberView>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT tm.user_id, tm.role, tm.joined_at, u.name, u.email, u.avatar
        FROM team_members tm
        JOIN users u ON u.id = tm.user_id
        WHERE tm.team_id = $1
        ORDER BY tm.joined_at ASC
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_member).collect())
}

/// Inserts a membership row; a unique violation means the user already belongs
pub async fn add_member(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO team_members (id, team_id, user_id, role, joined_at)
        VALUES ($1, $2, $3, $4, NOW())
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(team_id)
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns true when a membership row was removed
pub async fn remove_member(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_member_role(
    pool: &PgPool,
    team_id: Uuid,
    user_id: Uuid,
    role: TeamRole,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE team_members SET role = $3 WHERE team_id = $1 AND user_id = $2",
    )
    .bind(team_id)
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
