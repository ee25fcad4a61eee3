//! Integration tests for the realtime hub
//!
//! Exercises the publish/subscribe surface the SSE endpoint is built on,
//! without an HTTP server in the loop.

use collabhub::realtime::{RealtimeEvent, RealtimeHub, Room};
use uuid::Uuid;

#[tokio::test]
async fn test_event_reaches_every_room_subscriber() {
    let hub = RealtimeHub::new();
    let team = Room::Team(Uuid::new_v4());

    let mut rx_a = hub.subscribe(team);
    let mut rx_b = hub.subscribe(team);

    let delivered = hub.publish(
        team,
        RealtimeEvent::new("task:created", serde_json::json!({ "title": "Ship it" })),
    );
    assert_eq!(delivered, 2);

    for rx in [&mut rx_a, &mut rx_b] {
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "task:created");
        assert_eq!(event.payload["title"], "Ship it");
    }
}

#[tokio::test]
async fn test_user_room_is_isolated_from_team_room() {
    let hub = RealtimeHub::new();
    let user_id = Uuid::new_v4();

    let mut user_rx = hub.subscribe(Room::User(user_id));
    hub.publish(
        Room::Team(Uuid::new_v4()),
        RealtimeEvent::new("team:updated", serde_json::json!({})),
    );

    assert!(user_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_publish_survives_dropped_subscribers() {
    let hub = RealtimeHub::new();
    let chat = Room::Chat(Uuid::new_v4());

    let rx = hub.subscribe(chat);
    drop(rx);

    // All receivers gone: publish must not fail, it just reaches no one
    let delivered = hub.publish(
        chat,
        RealtimeEvent::new("chat:message:new", serde_json::json!({})),
    );
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_cleanup_only_removes_idle_rooms() {
    let hub = RealtimeHub::new();
    let active = Room::Chat(Uuid::new_v4());
    let idle = Room::Chat(Uuid::new_v4());

    let _active_rx = hub.subscribe(active);
    let idle_rx = hub.subscribe(idle);
    drop(idle_rx);

    let removed = hub.cleanup_inactive_rooms();
    assert_eq!(removed, 1);
    assert_eq!(hub.subscriber_count(active), 1);
    assert_eq!(hub.subscriber_count(idle), 0);
}

#[test]
fn test_room_wire_names_round_trip() {
    let id = Uuid::new_v4();
    for (room, prefix) in [
        (Room::User(id), "user"),
        (Room::Team(id), "team"),
        (Room::Chat(id), "chat"),
    ] {
        // Clients request `kind:uuid`, events are tagged `kind-uuid`
        let parsed: Room = format!("{prefix}:{id}").parse().unwrap();
        assert_eq!(parsed, room);
        assert_eq!(room.to_string(), format!("{prefix}-{id}"));
    }
}
