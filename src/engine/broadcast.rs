//! Room-scoped event fanout.
//!
//! Delivery is best-effort and at-most-once per subscriber: a receiver that
//! lags past the channel capacity, or that was not subscribed when an event
//! fired, simply misses it and reconciles through the read path. Events
//! published to one room reach every subscriber in publish order; nothing is
//! guaranteed across rooms.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::config::ROOM_CHANNEL_CAPACITY;
use crate::engine::events::{Event, Room};

/// Publishes committed state transitions to per-room subscriber groups.
pub struct Broadcaster {
    rooms: RwLock<HashMap<Room, broadcast::Sender<Event>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Join a room. Subscribing is idempotent in the sense that each call
    /// returns an independent receiver; dropping the receiver leaves the
    /// room. Events published before the call are not replayed.
    pub fn subscribe(&self, room: Room) -> broadcast::Receiver<Event> {
        let mut rooms = self.rooms.write();
        rooms
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Enqueue an event for every current subscriber of a room and return
    /// how many will receive it. Never blocks; a room nobody watches
    /// swallows the event.
    pub fn publish(&self, room: Room, event: Event) -> usize {
        let rooms = self.rooms.read();
        let Some(sender) = rooms.get(&room) else {
            trace!("No subscribers in room {}, dropping event", room);
            return 0;
        };

        match sender.send(event) {
            Ok(count) => {
                trace!("Delivered event to {} subscriber(s) in room {}", count, room);
                count
            }
            Err(_) => {
                // All receivers dropped since the room was created.
                debug!("Room {} is empty, dropping event", room);
                0
            }
        }
    }

    /// Current subscriber count for a room.
    pub fn subscriber_count(&self, room: Room) -> usize {
        self.rooms
            .read()
            .get(&room)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
