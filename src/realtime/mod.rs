/**
 * Real-time Fan-out
 *
 * A publish/subscribe layer keyed by room names (per-user, per-team,
 * per-chat). Controllers publish change events after successful
 * mutations; connected clients receive them over an SSE stream.
 *
 * The hub is an explicitly constructed service held in `AppState` and
 * passed by handle to everything that publishes; there is no global
 * registry. Delivery is at-most-once and best-effort: publishing never
 * blocks, and a disconnected subscriber simply misses the event.
 */

pub mod event;
pub mod hub;
pub mod subscription;

pub use event::{RealtimeEvent, Room};
pub use hub::RealtimeHub;
