/**
 * API Route Configuration
 *
 * One `configure_*_routes` function per resource family; the router
 * module composes them and applies the authentication middleware to the
 * whole protected tree.
 */

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::server::state::AppState;
use crate::{
    activity, chats, comments, events, files, notifications, subtasks, tasks, teams, users,
};

pub fn configure_user_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/users/me",
            get(users::handlers::get_me).patch(users::handlers::update_me),
        )
        .route("/api/users/me/status", patch(users::handlers::update_status))
        .route("/api/users/search", get(users::handlers::search_users))
        .route("/api/users/check-email", post(users::handlers::check_email))
}

pub fn configure_team_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/teams",
            get(teams::handlers::get_teams).post(teams::handlers::create_team),
        )
        .route(
            "/api/teams/{team_id}",
            get(teams::handlers::get_team)
                .put(teams::handlers::update_team)
                .delete(teams::handlers::delete_team),
        )
        .route(
            "/api/teams/{team_id}/settings",
            put(teams::handlers::update_settings),
        )
        .route(
            "/api/teams/{team_id}/members",
            get(teams::members::get_members).post(teams::members::add_member),
        )
        .route(
            "/api/teams/{team_id}/members/{user_id}",
            put(teams::members::update_member_role).delete(teams::members::remove_member),
        )
        .route("/api/teams/{team_id}/leave", post(teams::members::leave_team))
}

pub fn configure_task_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/tasks",
            get(tasks::handlers::get_tasks).post(tasks::handlers::create_task),
        )
        .route("/api/tasks/reorder", put(tasks::handlers::reorder_tasks))
        .route(
            "/api/tasks/{task_id}",
            get(tasks::handlers::get_task)
                .put(tasks::handlers::update_task)
                .delete(tasks::handlers::delete_task),
        )
        .route(
            "/api/tasks/{task_id}/status",
            put(tasks::handlers::update_task_status),
        )
        .route(
            "/api/tasks/{task_id}/subtasks",
            get(subtasks::handlers::get_subtasks).post(subtasks::handlers::create_subtask),
        )
        .route(
            "/api/tasks/{task_id}/subtasks/{subtask_id}",
            put(subtasks::handlers::update_subtask).delete(subtasks::handlers::delete_subtask),
        )
        .route(
            "/api/tasks/{task_id}/subtasks/{subtask_id}/progress",
            patch(subtasks::handlers::update_progress),
        )
        .route(
            "/api/tasks/{task_id}/subtasks/{subtask_id}/dependencies",
            post(subtasks::handlers::add_dependency),
        )
        .route(
            "/api/tasks/{task_id}/subtasks/{subtask_id}/dependencies/{dependency_id}",
            delete(subtasks::handlers::remove_dependency),
        )
        .route(
            "/api/tasks/{task_id}/comments",
            get(comments::handlers::get_comments).post(comments::handlers::create_comment),
        )
        .route(
            "/api/tasks/{task_id}/comments/{comment_id}",
            put(comments::handlers::update_comment).delete(comments::handlers::delete_comment),
        )
        .route(
            "/api/tasks/{task_id}/comments/{comment_id}/reactions",
            post(comments::reactions::add_reaction),
        )
        .route(
            "/api/tasks/{task_id}/comments/{comment_id}/reactions/{reaction}",
            delete(comments::reactions::remove_reaction),
        )
        .route(
            "/api/tasks/{task_id}/files",
            get(files::handlers::get_files).post(files::handlers::upload_file),
        )
        .route(
            "/api/tasks/{task_id}/files/{file_id}",
            delete(files::handlers::delete_file),
        )
}

pub fn configure_event_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/events",
            get(events::handlers::get_events).post(events::handlers::create_event),
        )
        .route(
            "/api/events/{event_id}",
            get(events::handlers::get_event)
                .put(events::handlers::update_event)
                .delete(events::handlers::delete_event),
        )
}

pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/chats",
            get(chats::handlers::get_chats).post(chats::handlers::create_chat),
        )
        .route(
            "/api/chats/{chat_id}",
            get(chats::handlers::get_chat).delete(chats::handlers::delete_chat),
        )
        .route("/api/chats/{chat_id}/users", post(chats::handlers::add_user))
        .route(
            "/api/chats/{chat_id}/users/{user_id}",
            delete(chats::handlers::remove_user),
        )
        .route("/api/chats/{chat_id}/read", put(chats::handlers::mark_read))
        .route(
            "/api/chats/{chat_id}/messages",
            get(chats::messages::get_messages).post(chats::messages::send_message),
        )
        .route(
            "/api/chats/{chat_id}/messages/{message_id}",
            put(chats::messages::edit_message).delete(chats::messages::delete_message),
        )
        .route(
            "/api/chats/{chat_id}/messages/{message_id}/files",
            post(chats::messages::upload_message_file),
        )
        .route(
            "/api/chats/{chat_id}/messages/{message_id}/files/{file_id}",
            delete(chats::messages::delete_message_file),
        )
}

pub fn configure_notification_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/notifications",
            get(notifications::handlers::list_notifications),
        )
        .route(
            "/api/notifications/read-all",
            patch(notifications::handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{notification_id}/read",
            patch(notifications::handlers::mark_notification_read),
        )
        .route(
            "/api/notifications/{notification_id}",
            delete(notifications::handlers::delete_notification),
        )
}

pub fn configure_activity_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/activity/me", get(activity::handlers::get_own_activity))
        .route(
            "/api/activity/teams/{team_id}",
            get(activity::handlers::get_team_activity),
        )
}
