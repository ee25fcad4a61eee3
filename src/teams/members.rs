//! Membership HTTP Handlers
//!
//! Add is by email; the owner row is protected and can never be removed
//! or demoted here, and no second owner can be assigned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::load_team_access;
use super::{db, AddMemberRequest, MemberView, TeamRole, UpdateMemberRoleRequest};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, Resource};
use crate::error::ApiError;
use crate::notifications;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::users;

/// GET /api/teams/{team_id}/members
pub async fn get_members(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let (_, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::Read)?;

    Ok(Json(db::list_members(&state.pool, team_id).await?))
}

/// POST /api/teams/{team_id}/members
///
/// The target user is looked up by email; adding an existing member is a
/// conflict.
pub async fn add_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Vec<MemberView>>), ApiError> {
    let (team, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::ManageMembers)?;

    let role = body.role.unwrap_or(TeamRole::Member);
    if role == TeamRole::Owner {
        return Err(ApiError::bad_request("Cannot assign the owner role"));
    }

    let target = users::db::get_user_by_email(&state.pool, body.email.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("No user with this email"))?;

    if db::get_member_role(&state.pool, team_id, target.id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("User is already a team member"));
    }

    db::add_member(&state.pool, team_id, target.id, role).await?;

    notifications::dispatch(
        &state.pool,
        &state.realtime,
        target.id,
        "team_invite",
        "Added to a team",
        &format!("You were added to the team \"{}\"", team.name),
        serde_json::json!({ "team_id": team_id, "role": role }),
    )
    .await;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new(
            "team:member:added",
            serde_json::json!({ "team_id": team_id, "user_id": target.id, "role": role }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        Some(team_id),
        ActivityDetails::MemberAdded { team_id, user_id: target.id },
    )
    .await;

    let members = db::list_members(&state.pool, team_id).await?;
    Ok((StatusCode::CREATED, Json(members)))
}

/// PUT /api/teams/{team_id}/members/{user_id}
///
/// Role changes are owner-only, unlike add/remove which admins may do.
pub async fn update_member_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<UpdateMemberRoleRequest>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let (team, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::ManageSettings)?;

    if member_id == team.owner_id {
        return Err(ApiError::conflict("Cannot change the owner's role"));
    }
    if body.role == TeamRole::Owner {
        return Err(ApiError::bad_request("Cannot assign the owner role"));
    }

    let updated = db::update_member_role(&state.pool, team_id, member_id, body.role).await?;
    if !updated {
        return Err(ApiError::not_found("Member not found"));
    }

    notifications::dispatch(
        &state.pool,
        &state.realtime,
        member_id,
        "role_update",
        "Team role updated",
        &format!(
            "Your role in \"{}\" is now {}",
            team.name, body.role
        ),
        serde_json::json!({ "team_id": team_id, "role": body.role }),
    )
    .await;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new(
            "team:member:role_updated",
            serde_json::json!({ "team_id": team_id, "user_id": member_id, "role": body.role }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        Some(team_id),
        ActivityDetails::MemberRoleUpdated {
            team_id,
            user_id: member_id,
            role: body.role.to_string(),
        },
    )
    .await;

    Ok(Json(db::list_members(&state.pool, team_id).await?))
}

/// DELETE /api/teams/{team_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthUser,
    Path((team_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (team, access) = load_team_access(&state, team_id, user.id).await?;
    authorize(user.id, Resource::Team(&access), Action::ManageMembers)?;

    if member_id == team.owner_id {
        return Err(ApiError::conflict("Cannot remove the team owner"));
    }

    let removed = db::remove_member(&state.pool, team_id, member_id).await?;
    if !removed {
        return Err(ApiError::not_found("Member not found"));
    }

    notifications::dispatch(
        &state.pool,
        &state.realtime,
        member_id,
        "team_removal",
        "Removed from a team",
        &format!("You were removed from the team \"{}\"", team.name),
        serde_json::json!({ "team_id": team_id }),
    )
    .await;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new(
            "team:member:removed",
            serde_json::json!({ "team_id": team_id, "user_id": member_id }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        Some(team_id),
        ActivityDetails::MemberRemoved { team_id, user_id: member_id },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Member removed" })))
}

/// POST /api/teams/{team_id}/leave
///
/// Any member except the owner may leave on their own.
pub async fn leave_team(
    State(state): State<AppState>,
    user: AuthUser,
    Path(team_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (team, access) = load_team_access(&state, team_id, user.id).await?;
    if access.role.is_none() {
        return Err(ApiError::not_found("Not a member of this team"));
    }
    if user.id == team.owner_id {
        return Err(ApiError::conflict(
            "The owner cannot leave; delete the team or transfer ownership first",
        ));
    }

    db::remove_member(&state.pool, team_id, user.id).await?;

    state.realtime.publish(
        Room::Team(team_id),
        RealtimeEvent::new(
            "team:member:removed",
            serde_json::json!({ "team_id": team_id, "user_id": user.id }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        Some(team_id),
        ActivityDetails::TeamLeft { team_id },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Left the team" })))
}
