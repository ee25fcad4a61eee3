//! Team HTTP Handlers
//!
//! Every handler resolves the team and the caller's standing on it, asks
//! `authz::authorize`, then performs the mutation and fans out.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{db, CreateTeamRequest, Team, TeamView, UpdateSettingsRequest, UpdateTeamRequest};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource, TeamAccess};
use crate::error::ApiError;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;

/// Loads the team and the caller's access projection, 404 when absent
pub(crate) async fn load_team_access(
    state: &AppState,
    team_id: Uuid,
    actor: Uuid,
) -> Result<(Team, TeamAccess), ApiError> {
    let team = db::get_team(&state.pool, team_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;
    let role = db::get_member_role(&state.pool, team_id, actor).await?;
    let access = TeamAccess { owner_id: team.owner_id, role };
    Ok((team, access))
}

async fn with_members(state: &AppState, team: Team) -> Result<TeamView, ApiError> {
    let members = db::list_members(&state.pool, team.id).await?;
    Ok(TeamView { team, members })
}

/// GET /api/teams
pub async fn get_teams(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TeamView>>, ApiError> {
    let teams = db::list_teams_for_user(&state.pool, user.id).await?;

    let mut views = Vec::with_capacity(teams.len());
    for team in teams {
        views.push(with_members(&state, team).await?);
    }
    Ok(Json(views))
}

/// GET /api/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamView>, ApiError> {
    let (team, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::Read)?;

    Ok(Json(with_members(&state, team).await?))
}

/// POST /api/teams
pub async fn create_team(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamView>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Team name is required"));
    }

    let settings = body.settings.unwrap_or_else(|| serde_json::json!({}));
    let team = db::create_team(
        &state.pool,
        user.id,
        name,
        body.description.as_deref(),
        body.avatar.as_deref(),
        &settings,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(with_members(&state, team).await?)))
}

/// PUT /api/teams/{team_id}
pub async fn update_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    Json(body): Json<UpdateTeamRequest>,
) -> Result<Json<TeamView>, ApiError> {
    let (_, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::Update)?;

    let team = db::update_team(
        &state.pool,
        team_id,
        body.name.as_deref(),
        body.description.as_deref(),
        body.avatar.as_deref(),
        body.settings.as_ref(),
    )
    .await?;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new("team:updated", serde_json::to_value(&team)?),
    );

    Ok(Json(with_members(&state, team).await?))
}

/// PUT /api/teams/{team_id}/settings
///
/// Owner-only; replaces the settings document wholesale.
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<Team>, ApiError> {
    let (_, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::ManageSettings)?;

    let team = db::update_settings(&state.pool, team_id, &body.settings).await?;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new("team:updated", serde_json::to_value(&team)?),
    );

    Ok(Json(team))
}

/// DELETE /api/teams/{team_id}
pub async fn delete_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (_, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::Delete)?;

    // Announce before the room's membership rows disappear
    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new("team:deleted", serde_json::json!({ "id": team_id })),
    );

    let file_paths = db::delete_team(&state.pool, team_id).await?;

    // Attachment rows are gone with the tasks, unlink their disk files
    crate::files::handlers::remove_upload_files(&state.config.upload_dir, &file_paths).await;

    Ok(Json(serde_json::json!({ "message": "Team deleted" })))
}
