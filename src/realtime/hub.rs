/**
 * Realtime Hub
 *
 * Manages one broadcast channel per room, created lazily on first use.
 * Cloning the hub shares the underlying channel map, so the same handle
 * can live in `AppState` and in background tasks.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use super::event::{RealtimeEvent, Room};

const ROOM_CHANNEL_CAPACITY: usize = 256;

/// Room-keyed publish/subscribe service
#[derive(Clone)]
pub struct RealtimeHub {
    channels: Arc<Mutex<HashMap<Room, broadcast::Sender<RealtimeEvent>>>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get or create the broadcast sender for a room
    fn sender(&self, room: Room) -> broadcast::Sender<RealtimeEvent> {
        let mut channels = self.channels.lock().expect("realtime hub lock poisoned");
        channels
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribe to a room's event stream
    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<RealtimeEvent> {
        self.sender(room).subscribe()
    }

    /// Publish an event into a room
    ///
    /// Never blocks and never fails the caller; returns the number of
    /// subscribers that received the event (0 if the room is empty).
    pub fn publish(&self, room: Room, event: RealtimeEvent) -> usize {
        let maybe_sender = {
            let channels = self.channels.lock().expect("realtime hub lock poisoned");
            channels.get(&room).cloned()
        };

        match maybe_sender {
            Some(sender) => match sender.send(event) {
                Ok(count) => {
                    tracing::debug!("published to {room}: {count} subscribers");
                    count
                }
                Err(_) => {
                    tracing::debug!("published to {room}: no subscribers");
                    0
                }
            },
            None => 0,
        }
    }

    /// Drop channels that no longer have any subscriber; returns how
    /// many rooms were removed
    pub fn cleanup_inactive_rooms(&self) -> usize {
        let mut channels = self.channels.lock().expect("realtime hub lock poisoned");
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    /// Number of subscribers currently in a room
    pub fn subscriber_count(&self, room: Room) -> usize {
        self.channels
            .lock()
            .expect("realtime hub lock poisoned")
            .get(&room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = RealtimeHub::new();
        let room = Room::User(Uuid::new_v4());
        let delivered = hub.publish(room, RealtimeEvent::new("task:updated", serde_json::json!({})));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let hub = RealtimeHub::new();
        let room = Room::Team(Uuid::new_v4());

        let mut rx = hub.subscribe(room);
        let delivered = hub.publish(
            room,
            RealtimeEvent::new("comment:added", serde_json::json!({"id": 1})),
        );
        assert_eq!(delivered, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "comment:added");
    }

    #[tokio::test]
    async fn test_rooms_do_not_cross_talk() {
        let hub = RealtimeHub::new();
        let team_a = Room::Team(Uuid::new_v4());
        let team_b = Room::Team(Uuid::new_v4());

        let mut rx_b = hub.subscribe(team_b);
        hub.publish(team_a, RealtimeEvent::new("task:created", serde_json::json!({})));

        assert!(matches!(
            rx_b.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_cleanup_drops_empty_rooms() {
        let hub = RealtimeHub::new();
        let room = Room::Chat(Uuid::new_v4());

        let rx = hub.subscribe(room);
        assert_eq!(hub.subscriber_count(room), 1);

        drop(rx);
        hub.cleanup_inactive_rooms();
        assert_eq!(hub.subscriber_count(room), 0);
    }
}
