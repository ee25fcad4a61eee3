//! CollabHub - Team Collaboration Backend
//!
//! CollabHub is the backend for a team-collaboration workspace: tasks
//! with subtasks, comments and reactions, teams with per-member roles,
//! a calendar with recurring events, direct and group chats, and
//! per-user notifications, all fanned out to connected clients over
//! Server-Sent Events.
//!
//! # Module Structure
//!
//! Each resource family owns its module with the same internal shape:
//! request/response types in `mod.rs`, store access in `db.rs`, and
//! HTTP handlers in `handlers.rs`.
//!
//! - **`auth`** - bearer-token verification and identity resolution
//! - **`authz`** - the pure authorization rules every handler consults
//! - **`users`**, **`teams`**, **`tasks`**, **`subtasks`**,
//!   **`comments`**, **`files`**, **`events`**, **`chats`** - resources
//! - **`notifications`**, **`activity`** - best-effort side channels
//! - **`realtime`** - the room-keyed publish/subscribe hub and its SSE
//!   subscription endpoint
//! - **`routes`**, **`server`** - router composition and startup
//!
//! # Error Handling
//!
//! Handlers return `Result<_, error::ApiError>`; every failure renders
//! as a JSON body `{"error", "status"}` with internal detail kept to
//! the logs.

pub mod activity;
pub mod auth;
pub mod authz;
pub mod chats;
pub mod comments;
pub mod error;
pub mod events;
pub mod files;
pub mod notifications;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod subtasks;
pub mod tasks;
pub mod teams;
pub mod users;
