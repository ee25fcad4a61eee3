/**
 * Subtasks
 *
 * Checklist items under a task with a 0-100 progress value and an
 * optional dependency list pointing at sibling subtasks. Access follows
 * the parent task's rule; there is no separate subtask-level
 * authorization, except that an assignee may update progress on their
 * own subtask.
 */

pub mod db;
pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Completion percentage, 0-100
    pub progress: i32,
    pub sort_order: i32,
    pub creator_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    /// Sibling subtasks this one waits on
    pub dependencies: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubtaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Distinguishes an absent field from an explicit `null`, so a request
/// can clear the assignee instead of only replacing it.
fn assignee_patch<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubtaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub progress: Option<i32>,
    pub sort_order: Option<i32>,
    /// `None` leaves the assignee alone, `Some(None)` clears it
    #[serde(default, deserialize_with = "assignee_patch")]
    pub assigned_to: Option<Option<Uuid>>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub progress: i32,
}

#[derive(Debug, Deserialize)]
pub struct AddDependencyRequest {
    pub dependency_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_assignee_leaves_field_alone() {
        let body: UpdateSubtaskRequest = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert_eq!(body.assigned_to, None);
    }

    #[test]
    fn test_null_assignee_clears() {
        let body: UpdateSubtaskRequest =
            serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        assert_eq!(body.assigned_to, Some(None));
    }

    #[test]
    fn test_assignee_value_reassigns() {
        let id = Uuid::new_v4();
        let body: UpdateSubtaskRequest =
            serde_json::from_str(&format!(r#"{{"assigned_to": "{id}"}}"#)).unwrap();
        assert_eq!(body.assigned_to, Some(Some(id)));
    }
}
