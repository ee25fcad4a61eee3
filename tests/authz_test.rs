//! Integration tests for the authorization rules
//!
//! Walks the cross-resource scenarios handlers rely on; the per-rule
//! details live next to the rules themselves.

use collabhub::authz::{
    authorize, Action, ChatAccess, CommentAccess, EventAccess, MessageAccess, Resource,
    TaskAccess, TeamAccess,
};
use collabhub::chats::ChatRole;
use collabhub::teams::TeamRole;
use uuid::Uuid;

#[test]
fn test_team_task_lifecycle_roles() {
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();

    let task_for = |role: Option<TeamRole>| TaskAccess {
        creator_id: owner,
        team: Some(TeamAccess { owner_id: owner, role }),
    };

    // A member works on the task like the creator does
    let as_member = task_for(Some(TeamRole::Member));
    for action in [Action::Read, Action::Update, Action::Delete] {
        assert!(authorize(member, Resource::Task(&as_member), action).is_ok());
    }

    // An outsider sees nothing
    let as_outsider = task_for(None);
    assert!(authorize(outsider, Resource::Task(&as_outsider), Action::Read).is_err());
}

#[test]
fn test_comment_moderation_follows_team_role() {
    let author = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let member = Uuid::new_v4();

    let comment_for = |role: TeamRole| CommentAccess {
        author_id: author,
        task: TaskAccess {
            creator_id: Uuid::new_v4(),
            team: Some(TeamAccess { owner_id: Uuid::new_v4(), role: Some(role) }),
        },
    };

    let seen_by_admin = comment_for(TeamRole::Admin);
    assert!(authorize(admin, Resource::Comment(&seen_by_admin), Action::Delete).is_ok());

    let seen_by_member = comment_for(TeamRole::Member);
    assert!(authorize(member, Resource::Comment(&seen_by_member), Action::Delete).is_err());
    assert!(authorize(member, Resource::Comment(&seen_by_member), Action::Post).is_ok());

    // The author can always fix their own words
    let own = comment_for(TeamRole::Member);
    assert!(authorize(author, Resource::Comment(&own), Action::Update).is_ok());
}

#[test]
fn test_chat_roles_split_messaging_and_management() {
    let owner = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let member = Uuid::new_v4();

    let chat_for = |role: Option<ChatRole>| ChatAccess { owner_id: owner, role };

    let as_admin = chat_for(Some(ChatRole::Admin));
    assert!(authorize(admin, Resource::Chat(&as_admin), Action::ManageMembers).is_ok());
    assert!(authorize(admin, Resource::Chat(&as_admin), Action::Delete).is_err());

    let as_owner = chat_for(Some(ChatRole::Admin));
    assert!(authorize(owner, Resource::Chat(&as_owner), Action::Delete).is_ok());

    let as_member = chat_for(Some(ChatRole::Member));
    assert!(authorize(member, Resource::Chat(&as_member), Action::Post).is_ok());
    assert!(authorize(member, Resource::Chat(&as_member), Action::ManageMembers).is_err());
}

#[test]
fn test_team_event_visible_to_members_but_owned_mutations() {
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();

    let event_for = |role: Option<TeamRole>| EventAccess {
        owner_id: owner,
        team: Some(TeamAccess { owner_id: Uuid::new_v4(), role }),
    };

    // A member who sees the event in the team listing can also fetch it
    let as_member = event_for(Some(TeamRole::Member));
    assert!(authorize(member, Resource::Event(&as_member), Action::Read).is_ok());
    assert!(authorize(member, Resource::Event(&as_member), Action::Update).is_err());
    assert!(authorize(member, Resource::Event(&as_member), Action::Delete).is_err());

    let as_outsider = event_for(None);
    assert!(authorize(outsider, Resource::Event(&as_outsider), Action::Read).is_err());

    // The owner keeps full control regardless of team role
    let own = event_for(None);
    assert!(authorize(owner, Resource::Event(&own), Action::Delete).is_ok());
}

#[test]
fn test_message_edits_stay_with_the_author() {
    let author = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let message = MessageAccess {
        author_id: author,
        chat: ChatAccess {
            owner_id: admin,
            role: Some(ChatRole::Admin),
        },
    };

    // Even a chat admin cannot rewrite someone else's message
    assert!(authorize(admin, Resource::Message(&message), Action::Update).is_err());
    assert!(authorize(admin, Resource::Message(&message), Action::Delete).is_err());
    assert!(authorize(author, Resource::Message(&message), Action::Update).is_ok());
}
