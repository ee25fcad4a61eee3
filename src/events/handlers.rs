//! Event HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::{
    db, expand_rule, CreateEventRequest, DeleteEventQuery, DeleteScope, Event, ListEventsQuery,
    UpdateEventRequest, UpdateScope,
};
use crate::activity::{self, ActivityDetails};
use crate::auth::AuthUser;
use crate::authz::{authorize, Action, EventAccess, Resource, TeamAccess};
use crate::error::ApiError;
use crate::realtime::{RealtimeEvent, Room};
use crate::server::state::AppState;
use crate::teams;

fn event_room(event: &Event) -> Room {
    match event.team_id {
        Some(team_id) => Room::Team(team_id),
        None => Room::User(event.owner_id),
    }
}

async fn load_authorized_event(
    state: &AppState,
    event_id: Uuid,
    actor: Uuid,
    action: Action,
) -> Result<Event, ApiError> {
    let event = db::get_event(&state.pool, event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    let team = match event.team_id {
        Some(team_id) => {
            let team = teams::db::get_team(&state.pool, team_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Team not found"))?;
            let role = teams::db::get_member_role(&state.pool, team_id, actor).await?;
            Some(TeamAccess { owner_id: team.owner_id, role })
        }
        None => None,
    };
    let access = EventAccess { owner_id: event.owner_id, team };
    authorize(actor, Resource::Event(&access), action)?;
    Ok(event)
}

/// GET /api/events
pub async fn get_events(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = db::list_events(
        &state.pool,
        user.id,
        query.team_id,
        query.event_type.as_deref(),
        query.start,
        query.end,
    )
    .await?;

    Ok(Json(events))
}

/// GET /api/events/{event_id}
pub async fn get_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let event = load_authorized_event(&state, event_id, user.id, Action::Read).await?;
    Ok(Json(event))
}

/// POST /api/events
///
/// A recurrence rule is expanded synchronously; the response is the
/// series parent, children are visible through the list endpoint.
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Event title is required"));
    }
    if body.end_at <= body.start_at {
        return Err(ApiError::bad_request("Event end must be after its start"));
    }

    let recurrence_json = body
        .recurrence
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?;

    let event = db::create_event(
        &state.pool,
        user.id,
        title,
        body.description.as_deref(),
        body.start_at,
        body.end_at,
        body.all_day.unwrap_or(false),
        body.location.as_deref(),
        body.color.as_deref(),
        body.event_type.as_deref(),
        recurrence_json.as_ref(),
        body.team_id,
        body.task_id,
    )
    .await?;

    if let Some(rule) = &body.recurrence {
        let occurrences = expand_rule(rule, event.start_at, event.end_at);
        let inserted = db::insert_occurrences(&state.pool, &event, &occurrences).await?;
        tracing::debug!("expanded event {} into {inserted} occurrences", event.id);
    }

    state.realtime.publish(
        event_room(&event),
        RealtimeEvent::new("event:created", serde_json::to_value(&event)?),
    );

    activity::record(
        &state.pool,
        user.id,
        event.team_id,
        ActivityDetails::EventCreated { event_id: event.id },
    )
    .await;

    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/events/{event_id}
///
/// `update_scope=this` on a series occurrence turns it into an exception
/// before editing it. `update_scope=all` applies the shared fields to the
/// parent and every future, non-exception occurrence; start and end
/// changes always stay on the addressed row.
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let event = load_authorized_event(&state, event_id, user.id, Action::Update).await?;

    let new_start = body.start_at.unwrap_or(event.start_at);
    let new_end = body.end_at.unwrap_or(event.end_at);
    if new_end <= new_start {
        return Err(ApiError::bad_request("Event end must be after its start"));
    }

    match body.update_scope {
        UpdateScope::This => {
            if event.parent_event_id.is_some() {
                db::mark_exception(&state.pool, event_id).await?;
            }
        }
        UpdateScope::All => {
            let series_root = event.parent_event_id.unwrap_or(event.id);
            db::update_future_occurrences(
                &state.pool,
                series_root,
                Utc::now(),
                body.title.as_deref().map(str::trim),
                body.description.as_deref(),
                body.all_day,
                body.location.as_deref(),
                body.color.as_deref(),
                body.event_type.as_deref(),
            )
            .await?;
        }
    }

    let event = db::update_event(
        &state.pool,
        event_id,
        body.title.as_deref().map(str::trim),
        body.description.as_deref(),
        body.start_at,
        body.end_at,
        body.all_day,
        body.location.as_deref(),
        body.color.as_deref(),
        body.event_type.as_deref(),
    )
    .await?;

    state.realtime.publish(
        event_room(&event),
        RealtimeEvent::new("event:updated", serde_json::to_value(&event)?),
    );

    Ok(Json(event))
}

/// DELETE /api/events/{event_id}
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Query(query): Query<DeleteEventQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event = load_authorized_event(&state, event_id, user.id, Action::Delete).await?;

    let removed = match query.delete_scope {
        DeleteScope::This => {
            db::delete_event(&state.pool, event_id).await?;
            1
        }
        DeleteScope::All => {
            let series_root = event.parent_event_id.unwrap_or(event.id);
            db::delete_series(&state.pool, series_root).await?
        }
    };

    state.realtime.publish(
        event_room(&event),
        RealtimeEvent::new(
            "event:deleted",
            serde_json::json!({ "id": event_id, "removed": removed }),
        ),
    );

    activity::record(
        &state.pool,
        user.id,
        event.team_id,
        ActivityDetails::EventDeleted { event_id },
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Event deleted" })))
}
