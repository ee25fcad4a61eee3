/**
 * Activity Detail Payloads
 *
 * Audit details are a tagged union of known shapes per action type
 * rather than free-form JSON. The `Unknown` variant is the escape hatch
 * for payloads recorded by older or newer versions of the server.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityDetails {
    TaskCreated { task_id: Uuid },
    TaskUpdated { task_id: Uuid },
    TaskDeleted { task_id: Uuid },
    CommentAdded { task_id: Uuid, comment_id: Uuid },
    SubtaskCreated { task_id: Uuid, subtask_id: Uuid },
    SubtaskUpdated { task_id: Uuid, subtask_id: Uuid },
    SubtaskDeleted { task_id: Uuid, subtask_id: Uuid },
    FileUploaded { task_id: Uuid, file_id: Uuid, file_name: String },
    FileDeleted { task_id: Uuid, file_id: Uuid, file_name: String },
    MemberAdded { team_id: Uuid, user_id: Uuid },
    MemberRemoved { team_id: Uuid, user_id: Uuid },
    MemberRoleUpdated { team_id: Uuid, user_id: Uuid, role: String },
    TeamLeft { team_id: Uuid },
    EventCreated { event_id: Uuid },
    EventDeleted { event_id: Uuid },
    /// Forward-compatible escape hatch for unrecognized payloads
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

impl ActivityDetails {
    /// Stable action name persisted alongside the payload
    pub fn action(&self) -> &'static str {
        match self {
            Self::TaskCreated { .. } => "task_created",
            Self::TaskUpdated { .. } => "task_updated",
            Self::TaskDeleted { .. } => "task_deleted",
            Self::CommentAdded { .. } => "comment_added",
            Self::SubtaskCreated { .. } => "subtask_created",
            Self::SubtaskUpdated { .. } => "subtask_updated",
            Self::SubtaskDeleted { .. } => "subtask_deleted",
            Self::FileUploaded { .. } => "file_uploaded",
            Self::FileDeleted { .. } => "file_deleted",
            Self::MemberAdded { .. } => "member_added",
            Self::MemberRemoved { .. } => "member_removed",
            Self::MemberRoleUpdated { .. } => "member_role_updated",
            Self::TeamLeft { .. } => "team_left",
            Self::EventCreated { .. } => "event_created",
            Self::EventDeleted { .. } => "event_deleted",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_serialize_with_tag() {
        let details = ActivityDetails::TaskCreated { task_id: Uuid::nil() };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["kind"], "task_created");
        assert_eq!(value["task_id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_known_payload_round_trips() {
        let details = ActivityDetails::MemberRoleUpdated {
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "admin".to_string(),
        };
        let value = serde_json::to_value(&details).unwrap();
        let back: ActivityDetails = serde_json::from_value(value).unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_unrecognized_payload_falls_back_to_unknown() {
        let value = serde_json::json!({"kind": "something_new", "extra": 42});
        let details: ActivityDetails = serde_json::from_value(value.clone()).unwrap();
        match details {
            ActivityDetails::Unknown(v) => assert_eq!(v, value),
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(
            ActivityDetails::Unknown(serde_json::json!({})).action(),
            "unknown"
        );
    }
}
