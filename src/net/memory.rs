//! In-process store and change feed
//!
//! Clones share the same tables, so several sessions in one process behave
//! like several browsers connected to the same hosted database. Used by the
//! tests, the native demo and offline play.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::feed::{ChangeEvent, ChangeFeed, FeedSender, Subscription};
use super::records::{
    ChatMessage, MessageKind, NewMessage, NewRoom, PlayerPatch, PlayerRecord, RoomPatch,
    RoomRecord, RoomStatus,
};
use super::store::{RoomStore, StoreError};
use crate::sim::PlayerId;
use crate::stats::ProfileStats;

#[derive(Debug, Default)]
struct Tables {
    rooms: BTreeMap<String, RoomRecord>,
    players: BTreeMap<(String, PlayerId), PlayerRecord>,
    messages: Vec<ChatMessage>,
    stats: HashMap<PlayerId, ProfileStats>,
    subscribers: Vec<FeedSender>,
    next_room: u64,
    next_message: u64,
    /// Simulated outage: every call fails with `Unavailable`
    offline: bool,
}

impl Tables {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("memory backend offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Push an event to every live subscriber of its room
    fn publish(&mut self, event: ChangeEvent) {
        self.subscribers.retain(FeedSender::is_connected);
        for sender in &self.subscribers {
            if sender.room_id() == event.room_id() {
                sender.send(event.clone());
            }
        }
    }
}

/// Shared in-memory tables plus notification fan-out
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    tables: Rc<RefCell<Tables>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or recover)
    pub fn set_offline(&self, offline: bool) {
        self.tables.borrow_mut().offline = offline;
    }

    /// Live subscriptions across all rooms
    pub fn subscriber_count(&self) -> usize {
        let mut tables = self.tables.borrow_mut();
        tables.subscribers.retain(FeedSender::is_connected);
        tables.subscribers.len()
    }
}

impl RoomStore for MemoryBackend {
    fn create_room(&self, room: NewRoom) -> Result<RoomRecord, StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        if tables.rooms.values().any(|existing| existing.code == room.code) {
            return Err(StoreError::Conflict(format!("room code {} in use", room.code)));
        }

        tables.next_room += 1;
        let record = RoomRecord {
            id: format!("room-{}", tables.next_room),
            code: room.code,
            host_id: room.host_id,
            status: RoomStatus::Waiting,
            round: 0,
            level_index: 0,
            max_players: room.max_players,
        };
        tables.rooms.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn room(&self, room_id: &str) -> Result<RoomRecord, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        tables
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("room {}", room_id)))
    }

    fn room_by_code(&self, code: &str) -> Result<Option<RoomRecord>, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        Ok(tables.rooms.values().find(|room| room.code == code).cloned())
    }

    fn list_rooms(&self, status: RoomStatus) -> Result<Vec<RoomRecord>, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        Ok(tables
            .rooms
            .values()
            .filter(|room| room.status == status)
            .cloned()
            .collect())
    }

    fn update_room(&self, room_id: &str, patch: &RoomPatch) -> Result<RoomRecord, StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        let room = tables
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::not_found(format!("room {}", room_id)))?;
        patch.apply(room);
        let updated = room.clone();
        tables.publish(ChangeEvent::RoomUpdated(updated.clone()));
        Ok(updated)
    }

    fn upsert_player(&self, player: &PlayerRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        if !tables.rooms.contains_key(&player.room_id) {
            return Err(StoreError::not_found(format!("room {}", player.room_id)));
        }
        let key = (player.room_id.clone(), player.user_id.clone());
        tables.players.insert(key, player.clone());
        tables.publish(ChangeEvent::PlayerUpserted(player.clone()));
        Ok(())
    }

    fn players(&self, room_id: &str) -> Result<Vec<PlayerRecord>, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        Ok(tables
            .players
            .values()
            .filter(|player| player.room_id == room_id)
            .cloned()
            .collect())
    }

    fn update_player(
        &self,
        room_id: &str,
        user_id: &PlayerId,
        patch: &PlayerPatch,
    ) -> Result<PlayerRecord, StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        let key = (room_id.to_string(), user_id.clone());
        let player = tables
            .players
            .get_mut(&key)
            .ok_or_else(|| StoreError::not_found(format!("player {} in {}", user_id, room_id)))?;
        patch.apply(player);
        let updated = player.clone();
        tables.publish(ChangeEvent::PlayerUpserted(updated.clone()));
        Ok(updated)
    }

    fn remove_player(&self, room_id: &str, user_id: &PlayerId) -> Result<(), StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        let key = (room_id.to_string(), user_id.clone());
        if tables.players.remove(&key).is_none() {
            return Err(StoreError::not_found(format!("player {} in {}", user_id, room_id)));
        }
        tables.publish(ChangeEvent::PlayerDeleted {
            room_id: room_id.to_string(),
            user_id: user_id.clone(),
        });
        Ok(())
    }

    fn append_message(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        tables.next_message += 1;
        let record = ChatMessage {
            id: tables.next_message,
            room_id: message.room_id,
            user_id: message.user_id,
            display_name: message.display_name,
            kind: message.kind,
            body: message.body,
        };
        tables.messages.push(record.clone());
        tables.publish(ChangeEvent::MessageAppended(record.clone()));
        Ok(record)
    }

    fn messages(
        &self,
        room_id: &str,
        kind: Option<MessageKind>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        Ok(tables
            .messages
            .iter()
            .filter(|message| message.room_id == room_id)
            .filter(|message| kind.is_none_or(|kind| message.kind == kind))
            .cloned()
            .collect())
    }

    fn load_stats(&self, user_id: &PlayerId) -> Result<ProfileStats, StoreError> {
        let tables = self.tables.borrow();
        tables.check_online()?;
        Ok(tables.stats.get(user_id).cloned().unwrap_or_default())
    }

    fn save_stats(&self, user_id: &PlayerId, stats: &ProfileStats) -> Result<(), StoreError> {
        let mut tables = self.tables.borrow_mut();
        tables.check_online()?;
        tables.stats.insert(user_id.clone(), stats.clone());
        Ok(())
    }
}

impl ChangeFeed for MemoryBackend {
    fn subscribe(&self, room_id: &str) -> Subscription {
        let (subscription, sender) = Subscription::channel(room_id);
        self.tables.borrow_mut().subscribers.push(sender);
        log::debug!("Subscribed to room {}", room_id);
        subscription
    }
}
