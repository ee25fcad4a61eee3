/**
 * Authorization Rules
 *
 * A single pure function `authorize(actor, resource, action)` consulted by
 * every controller before touching the store. It consumes minimal
 * projections (ids and the actor's role on the surrounding team/chat)
 * loaded by the caller; no queries happen here, which keeps the rules
 * unit-testable in isolation.
 */

use uuid::Uuid;

use crate::chats::ChatRole;
use crate::error::ApiError;
use crate::teams::TeamRole;

/// What the actor is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read the resource or its children
    Read,
    /// Create child content (comments, subtasks, messages, files)
    Post,
    /// Mutate the resource itself
    Update,
    /// Remove the resource
    Delete,
    /// Add/remove members or change their roles
    ManageMembers,
    /// Change owner-level settings
    ManageSettings,
}

/// Denial with a stable human-readable reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied {
    pub reason: &'static str,
}

impl From<Denied> for ApiError {
    fn from(denied: Denied) -> Self {
        ApiError::forbidden(denied.reason)
    }
}

/// The actor's standing on a team: who owns it, and the actor's own
/// membership role if any
#[derive(Debug, Clone, Copy)]
pub struct TeamAccess {
    pub owner_id: Uuid,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Clone, Copy)]
pub struct TaskAccess {
    pub creator_id: Uuid,
    pub team: Option<TeamAccess>,
}

#[derive(Debug, Clone, Copy)]
pub struct CommentAccess {
    pub author_id: Uuid,
    pub task: TaskAccess,
}

/// The actor's standing in a chat
#[derive(Debug, Clone, Copy)]
pub struct ChatAccess {
    pub owner_id: Uuid,
    pub role: Option<ChatRole>,
}

#[derive(Debug, Clone, Copy)]
pub struct MessageAccess {
    pub author_id: Uuid,
    pub chat: ChatAccess,
}

/// The event's owner plus the actor's standing on the event's team, when
/// the event belongs to one
#[derive(Debug, Clone, Copy)]
pub struct EventAccess {
    pub owner_id: Uuid,
    pub team: Option<TeamAccess>,
}

#[derive(Debug, Clone, Copy)]
pub struct NotificationAccess {
    pub recipient_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Task(&'a TaskAccess),
    Team(&'a TeamAccess),
    Comment(&'a CommentAccess),
    Chat(&'a ChatAccess),
    Message(&'a MessageAccess),
    Event(&'a EventAccess),
    Notification(&'a NotificationAccess),
}

/// Decide whether `actor` may perform `action` on `resource`
pub fn authorize(actor: Uuid, resource: Resource<'_>, action: Action) -> Result<(), Denied> {
    match resource {
        Resource::Task(task) => authorize_task(actor, task),
        Resource::Team(team) => authorize_team(actor, team, action),
        Resource::Comment(comment) => authorize_comment(actor, comment, action),
        Resource::Chat(chat) => authorize_chat(actor, chat, action),
        Resource::Message(message) => authorize_message(actor, message, action),
        Resource::Event(event) => authorize_event(actor, event, action),
        Resource::Notification(notification) => allow_if(
            notification.recipient_id == actor,
            "Not authorized to access this notification",
        ),
    }
}

fn allow_if(condition: bool, reason: &'static str) -> Result<(), Denied> {
    if condition {
        Ok(())
    } else {
        Err(Denied { reason })
    }
}

// Every task action, reads included, requires being the creator or a
// member of the task's team.
fn authorize_task(actor: Uuid, task: &TaskAccess) -> Result<(), Denied> {
    let is_creator = task.creator_id == actor;
    let is_team_member = task.team.map(|t| t.role.is_some()).unwrap_or(false);
    allow_if(
        is_creator || is_team_member,
        "Not authorized to access this task",
    )
}

fn authorize_team(actor: Uuid, team: &TeamAccess, action: Action) -> Result<(), Denied> {
    let is_owner = team.owner_id == actor;
    let is_admin = matches!(team.role, Some(TeamRole::Admin) | Some(TeamRole::Owner));
    let is_member = team.role.is_some();

    match action {
        Action::Read => allow_if(is_owner || is_member, "No access to this team"),
        Action::Update | Action::ManageMembers => allow_if(
            is_owner || is_admin,
            "Not authorized to manage this team",
        ),
        Action::Delete | Action::ManageSettings => {
            allow_if(is_owner, "Only the team owner may do this")
        }
        Action::Post => allow_if(is_owner || is_member, "No access to this team"),
    }
}

fn authorize_comment(actor: Uuid, comment: &CommentAccess, action: Action) -> Result<(), Denied> {
    match action {
        // Reading and replying follow the surrounding task's rule
        Action::Read | Action::Post => authorize_task(actor, &comment.task),
        Action::Update | Action::Delete => {
            let is_author = comment.author_id == actor;
            let is_team_admin = comment
                .task
                .team
                .map(|t| matches!(t.role, Some(TeamRole::Admin) | Some(TeamRole::Owner)))
                .unwrap_or(false);
            allow_if(
                is_author || is_team_admin,
                "Not authorized to modify this comment",
            )
        }
        _ => Err(Denied {
            reason: "Not authorized to modify this comment",
        }),
    }
}

fn authorize_chat(actor: Uuid, chat: &ChatAccess, action: Action) -> Result<(), Denied> {
    let is_owner = chat.owner_id == actor;
    let is_member = chat.role.is_some();
    let is_admin = matches!(chat.role, Some(ChatRole::Admin));

    match action {
        Action::Read | Action::Post => allow_if(is_member || is_owner, "Not a chat member"),
        Action::ManageMembers => allow_if(is_admin, "Only a chat admin may manage members"),
        Action::Delete => allow_if(is_owner, "Only the chat owner may delete the chat"),
        _ => allow_if(is_admin || is_owner, "Not authorized to modify this chat"),
    }
}

// Team events are visible to every team member; mutating an event is
// reserved for its owner. This mirrors how listing surfaces them.
fn authorize_event(actor: Uuid, event: &EventAccess, action: Action) -> Result<(), Denied> {
    let is_owner = event.owner_id == actor;
    let is_team_member = event.team.map(|t| t.role.is_some()).unwrap_or(false);

    match action {
        Action::Read => allow_if(
            is_owner || is_team_member,
            "Not authorized to access this event",
        ),
        _ => allow_if(is_owner, "Only the event owner may modify this event"),
    }
}

fn authorize_message(actor: Uuid, message: &MessageAccess, action: Action) -> Result<(), Denied> {
    match action {
        Action::Read => authorize_chat(actor, &message.chat, Action::Read),
        Action::Update | Action::Delete => allow_if(
            message.author_id == actor,
            "Can only modify own messages",
        ),
        _ => Err(Denied {
            reason: "Not authorized to modify this message",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_task_creator_may_read_and_mutate() {
        let creator = uid();
        let task = TaskAccess { creator_id: creator, team: None };
        assert!(authorize(creator, Resource::Task(&task), Action::Read).is_ok());
        assert!(authorize(creator, Resource::Task(&task), Action::Delete).is_ok());
    }

    #[test]
    fn test_unrelated_user_is_denied_on_personal_task() {
        let task = TaskAccess { creator_id: uid(), team: None };
        let stranger = uid();
        let denied = authorize(stranger, Resource::Task(&task), Action::Read).unwrap_err();
        assert_eq!(denied.reason, "Not authorized to access this task");
    }

    #[test]
    fn test_team_member_may_access_team_task() {
        let member = uid();
        let task = TaskAccess {
            creator_id: uid(),
            team: Some(TeamAccess {
                owner_id: uid(),
                role: Some(TeamRole::Member),
            }),
        };
        assert!(authorize(member, Resource::Task(&task), Action::Update).is_ok());
    }

    #[test]
    fn test_non_member_is_denied_on_team_task() {
        let task = TaskAccess {
            creator_id: uid(),
            team: Some(TeamAccess { owner_id: uid(), role: None }),
        };
        assert!(authorize(uid(), Resource::Task(&task), Action::Read).is_err());
    }

    #[test]
    fn test_team_admin_may_update_but_not_delete_team() {
        let admin = uid();
        let team = TeamAccess {
            owner_id: uid(),
            role: Some(TeamRole::Admin),
        };
        assert!(authorize(admin, Resource::Team(&team), Action::Update).is_ok());
        assert!(authorize(admin, Resource::Team(&team), Action::ManageMembers).is_ok());
        assert!(authorize(admin, Resource::Team(&team), Action::Delete).is_err());
        assert!(authorize(admin, Resource::Team(&team), Action::ManageSettings).is_err());
    }

    #[test]
    fn test_plain_member_may_read_but_not_manage() {
        let member = uid();
        let team = TeamAccess {
            owner_id: uid(),
            role: Some(TeamRole::Member),
        };
        assert!(authorize(member, Resource::Team(&team), Action::Read).is_ok());
        assert!(authorize(member, Resource::Team(&team), Action::ManageMembers).is_err());
    }

    #[test]
    fn test_owner_may_do_everything_on_team() {
        let owner = uid();
        let team = TeamAccess {
            owner_id: owner,
            role: Some(TeamRole::Owner),
        };
        for action in [
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::ManageMembers,
            Action::ManageSettings,
        ] {
            assert!(authorize(owner, Resource::Team(&team), action).is_ok());
        }
    }

    #[test]
    fn test_comment_author_may_edit() {
        let author = uid();
        let comment = CommentAccess {
            author_id: author,
            task: TaskAccess { creator_id: uid(), team: None },
        };
        assert!(authorize(author, Resource::Comment(&comment), Action::Update).is_ok());
    }

    #[test]
    fn test_team_admin_may_delete_others_comment() {
        let admin = uid();
        let comment = CommentAccess {
            author_id: uid(),
            task: TaskAccess {
                creator_id: uid(),
                team: Some(TeamAccess {
                    owner_id: uid(),
                    role: Some(TeamRole::Admin),
                }),
            },
        };
        assert!(authorize(admin, Resource::Comment(&comment), Action::Delete).is_ok());
    }

    #[test]
    fn test_plain_member_may_not_edit_others_comment() {
        let member = uid();
        let comment = CommentAccess {
            author_id: uid(),
            task: TaskAccess {
                creator_id: uid(),
                team: Some(TeamAccess {
                    owner_id: uid(),
                    role: Some(TeamRole::Member),
                }),
            },
        };
        assert!(authorize(member, Resource::Comment(&comment), Action::Update).is_err());
        // but replying is fine
        assert!(authorize(member, Resource::Comment(&comment), Action::Post).is_ok());
    }

    #[test]
    fn test_chat_membership_rules() {
        let member = uid();
        let chat = ChatAccess {
            owner_id: uid(),
            role: Some(ChatRole::Member),
        };
        assert!(authorize(member, Resource::Chat(&chat), Action::Post).is_ok());
        assert!(authorize(member, Resource::Chat(&chat), Action::ManageMembers).is_err());
        assert!(authorize(member, Resource::Chat(&chat), Action::Delete).is_err());

        let stranger = uid();
        let outside = ChatAccess { owner_id: uid(), role: None };
        assert_eq!(
            authorize(stranger, Resource::Chat(&outside), Action::Read)
                .unwrap_err()
                .reason,
            "Not a chat member"
        );
    }

    #[test]
    fn test_message_author_only_edit() {
        let author = uid();
        let message = MessageAccess {
            author_id: author,
            chat: ChatAccess { owner_id: uid(), role: Some(ChatRole::Member) },
        };
        assert!(authorize(author, Resource::Message(&message), Action::Update).is_ok());

        let other = uid();
        assert!(authorize(other, Resource::Message(&message), Action::Delete).is_err());
    }

    #[test]
    fn test_event_owner_only() {
        let owner = uid();
        let event = EventAccess { owner_id: owner, team: None };
        assert!(authorize(owner, Resource::Event(&event), Action::Update).is_ok());
        assert!(authorize(uid(), Resource::Event(&event), Action::Update).is_err());
    }

    #[test]
    fn test_team_member_may_read_but_not_modify_team_event() {
        let member = uid();
        let event = EventAccess {
            owner_id: uid(),
            team: Some(TeamAccess {
                owner_id: uid(),
                role: Some(TeamRole::Member),
            }),
        };
        assert!(authorize(member, Resource::Event(&event), Action::Read).is_ok());
        assert!(authorize(member, Resource::Event(&event), Action::Update).is_err());
        assert!(authorize(member, Resource::Event(&event), Action::Delete).is_err());
    }

    #[test]
    fn test_non_member_is_denied_on_team_event() {
        let event = EventAccess {
            owner_id: uid(),
            team: Some(TeamAccess { owner_id: uid(), role: None }),
        };
        assert!(authorize(uid(), Resource::Event(&event), Action::Read).is_err());
    }

    #[test]
    fn test_notification_recipient_only() {
        let recipient = uid();
        let notification = NotificationAccess { recipient_id: recipient };
        assert!(authorize(recipient, Resource::Notification(&notification), Action::Delete).is_ok());
        assert!(authorize(uid(), Resource::Notification(&notification), Action::Read).is_err());
    }
}
