/**
 * Calendar Events
 *
 * Events are owned by a single user and may carry a recurrence rule.
 * A rule is expanded synchronously at creation into concrete child
 * rows; edits to a series either touch one occurrence (as an exception
 * row) or every future occurrence in place.
 */

pub mod db;
pub mod handlers;
pub mod recurrence;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use recurrence::{expand_rule, Frequency, Occurrence, RecurrenceRule};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub location: Option<String>,
    pub color: Option<String>,
    pub event_type: Option<String>,
    /// Recurrence rule, present on series parents only
    pub recurrence: Option<serde_json::Value>,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    /// Set on expanded occurrences and exceptions
    pub parent_event_id: Option<Uuid>,
    pub is_exception: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub team_id: Option<Uuid>,
    pub event_type: Option<String>,
    /// Window start; events overlapping [start, end] are returned
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub event_type: Option<String>,
    pub recurrence: Option<RecurrenceRule>,
    pub team_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
}

/// Which part of a series an update applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScope {
    /// Only the addressed occurrence; creates an exception row
    #[default]
    This,
    /// Every future occurrence of the series, in place
    All,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub color: Option<String>,
    pub event_type: Option<String>,
    #[serde(default)]
    pub update_scope: UpdateScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    #[default]
    This,
    All,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteEventQuery {
    #[serde(default)]
    pub delete_scope: DeleteScope,
}
