/**
 * Rooms and Event Envelopes
 *
 * A `Room` is a named broadcast group; clients subscribe to rooms, and
 * controllers publish `RealtimeEvent`s into them.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A named broadcast group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Personal room of one user
    User(Uuid),
    /// Shared room of a team
    Team(Uuid),
    /// Shared room of a chat
    Chat(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user-{id}"),
            Self::Team(id) => write!(f, "team-{id}"),
            Self::Chat(id) => write!(f, "chat-{id}"),
        }
    }
}

impl FromStr for Room {
    type Err = String;

    /// Parse the client-facing `kind:uuid` form, e.g. `team:3f2a...`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("malformed room name: {s}"))?;
        let id = Uuid::parse_str(id).map_err(|_| format!("malformed room id: {s}"))?;
        match kind {
            "user" => Ok(Self::User(id)),
            "team" => Ok(Self::Team(id)),
            "chat" => Ok(Self::Chat(id)),
            other => Err(format!("unknown room kind: {other}")),
        }
    }
}

/// Event pushed to every subscriber of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Event name, e.g. `task:updated` or `chat:message:new`
    pub event: String,
    /// JSON payload of the changed resource
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_display() {
        let id = Uuid::nil();
        assert_eq!(
            Room::Team(id).to_string(),
            "team-00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_room_parse_round_trip() {
        let id = Uuid::new_v4();
        let parsed: Room = format!("chat:{id}").parse().unwrap();
        assert_eq!(parsed, Room::Chat(id));
    }

    #[test]
    fn test_room_parse_rejects_garbage() {
        assert!("team".parse::<Room>().is_err());
        assert!("team:not-a-uuid".parse::<Room>().is_err());
        assert!("channel:00000000-0000-0000-0000-000000000000"
            .parse::<Room>()
            .is_err());
    }
}
