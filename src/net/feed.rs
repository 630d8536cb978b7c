//! Change feed
//!
//! A subscription is a mailbox for one room. The feed implementation pushes
//! row notifications into it as they arrive; the frame loop drains it once per
//! frame. Dropping the `Subscription` ends delivery.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use super::records::{ChatMessage, PlayerRecord, RoomRecord};
use crate::sim::PlayerId;

/// A row notification
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    PlayerUpserted(PlayerRecord),
    PlayerDeleted { room_id: String, user_id: PlayerId },
    RoomUpdated(RoomRecord),
    MessageAppended(ChatMessage),
}

impl ChangeEvent {
    pub fn room_id(&self) -> &str {
        match self {
            ChangeEvent::PlayerUpserted(player) => &player.room_id,
            ChangeEvent::PlayerDeleted { room_id, .. } => room_id,
            ChangeEvent::RoomUpdated(room) => &room.id,
            ChangeEvent::MessageAppended(message) => &message.room_id,
        }
    }
}

type Queue = RefCell<VecDeque<ChangeEvent>>;

/// Receiving end, owned by the session
#[derive(Debug)]
pub struct Subscription {
    room_id: String,
    queue: Rc<Queue>,
}

/// Sending end, held by the feed implementation
#[derive(Debug, Clone)]
pub struct FeedSender {
    room_id: String,
    queue: Weak<Queue>,
}

impl Subscription {
    /// Create a connected mailbox pair for a room
    pub fn channel(room_id: &str) -> (Self, FeedSender) {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        let sender = FeedSender {
            room_id: room_id.to_string(),
            queue: Rc::downgrade(&queue),
        };
        let subscription = Self {
            room_id: room_id.to_string(),
            queue,
        };
        (subscription, sender)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Take everything that arrived since the last drain, in arrival order
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl FeedSender {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Whether the subscription still exists
    pub fn is_connected(&self) -> bool {
        self.queue.strong_count() > 0
    }

    /// Deliver an event; returns false once the subscription was dropped
    pub fn send(&self, event: ChangeEvent) -> bool {
        match self.queue.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push_back(event);
                true
            }
            None => false,
        }
    }
}

/// Source of per-room change notifications
pub trait ChangeFeed {
    fn subscribe(&self, room_id: &str) -> Subscription;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::records::RoomStatus;

    fn room_event(round: u32) -> ChangeEvent {
        ChangeEvent::RoomUpdated(RoomRecord {
            id: "room-1".to_string(),
            code: "ABC234".to_string(),
            host_id: PlayerId::new("host"),
            status: RoomStatus::Playing,
            round,
            level_index: 0,
            max_players: 4,
        })
    }

    #[test]
    fn test_drain_in_arrival_order() {
        let (subscription, sender) = Subscription::channel("room-1");
        assert!(sender.send(room_event(1)));
        assert!(sender.send(room_event(2)));
        assert_eq!(subscription.pending(), 2);

        let events = subscription.drain();
        assert_eq!(events, vec![room_event(1), room_event(2)]);
        assert!(subscription.drain().is_empty());
    }

    #[test]
    fn test_dropped_subscription_disconnects() {
        let (subscription, sender) = Subscription::channel("room-1");
        assert!(sender.is_connected());
        drop(subscription);
        assert!(!sender.is_connected());
        assert!(!sender.send(room_event(1)));
    }
}
