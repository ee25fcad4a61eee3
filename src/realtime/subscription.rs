/**
 * Real-time Subscription Handler
 *
 * `GET /realtime?rooms=user:<id>,team:<id>,chat:<id>` opens a
 * Server-Sent Events stream merging the requested rooms. A client may
 * only join its own user room and the rooms of teams and chats it
 * belongs to; requesting anything else is forbidden.
 *
 * Omitting the `rooms` parameter subscribes to the caller's personal
 * room only.
 */

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::realtime::Room;
use crate::server::state::AppState;
use crate::{chats, teams};

pub async fn handle_realtime_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Sse<impl futures_util::Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let rooms = match params.get("rooms") {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Room>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(ApiError::bad_request)?,
        None => vec![Room::User(user.id)],
    };

    if rooms.is_empty() {
        return Err(ApiError::bad_request("No rooms requested"));
    }

    for room in &rooms {
        check_room_access(&state, &user, *room).await?;
    }

    tracing::info!(
        "user {} subscribed to {} room(s)",
        user.id,
        rooms.len()
    );

    let streams: Vec<_> = rooms
        .into_iter()
        .map(|room| BroadcastStream::new(state.realtime.subscribe(room)))
        .collect();

    let merged = stream::select_all(streams).filter_map(|item| async move {
        match item {
            Ok(event) => {
                let name = event.event.clone();
                Some(Event::default().event(name).json_data(&event))
            }
            // A lagged subscriber drops events rather than the connection
            Err(err) => {
                tracing::debug!("subscriber lagged: {err}");
                None
            }
        }
    });

    Ok(Sse::new(merged).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

async fn check_room_access(state: &AppState, user: &AuthUser, room: Room) -> Result<(), ApiError> {
    match room {
        Room::User(id) => {
            if id != user.id {
                return Err(ApiError::forbidden("Cannot join another user's room"));
            }
        }
        Room::Team(team_id) => {
            let membership =
                teams::db::get_member_role(&state.pool, team_id, user.id).await?;
            if membership.is_none() {
                return Err(ApiError::forbidden("Not a member of this team"));
            }
        }
        Room::Chat(chat_id) => {
            let membership = chats::db::get_chat_role(&state.pool, chat_id, user.id).await?;
            if membership.is_none() {
                return Err(ApiError::forbidden("Not a member of this chat"));
            }
        }
    }
    Ok(())
}
