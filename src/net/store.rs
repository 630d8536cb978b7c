//! Storage interface
//!
//! The game only needs simple filtered reads and writes on four tables
//! (rooms, room players, messages, profile stats). Implementations talk to
//! the hosted database; `MemoryBackend` keeps everything in process.

use super::records::{
    ChatMessage, MessageKind, NewMessage, NewRoom, PlayerPatch, PlayerRecord, RoomPatch,
    RoomRecord, RoomStatus,
};
use crate::sim::PlayerId;
use crate::stats::ProfileStats;

/// Storage errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound { what: what.into() }
    }

    /// Worth retrying later (network or service trouble)
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Row store used by the lobby and the session
pub trait RoomStore {
    /// Insert a room. Fails with `Conflict` when the code is taken.
    fn create_room(&self, room: NewRoom) -> Result<RoomRecord, StoreError>;

    fn room(&self, room_id: &str) -> Result<RoomRecord, StoreError>;

    fn room_by_code(&self, code: &str) -> Result<Option<RoomRecord>, StoreError>;

    fn list_rooms(&self, status: RoomStatus) -> Result<Vec<RoomRecord>, StoreError>;

    fn update_room(&self, room_id: &str, patch: &RoomPatch) -> Result<RoomRecord, StoreError>;

    /// Insert or replace the (room, user) row
    fn upsert_player(&self, player: &PlayerRecord) -> Result<(), StoreError>;

    fn players(&self, room_id: &str) -> Result<Vec<PlayerRecord>, StoreError>;

    fn update_player(
        &self,
        room_id: &str,
        user_id: &PlayerId,
        patch: &PlayerPatch,
    ) -> Result<PlayerRecord, StoreError>;

    fn remove_player(&self, room_id: &str, user_id: &PlayerId) -> Result<(), StoreError>;

    fn append_message(&self, message: NewMessage) -> Result<ChatMessage, StoreError>;

    /// Messages in insertion order, optionally filtered by kind
    fn messages(
        &self,
        room_id: &str,
        kind: Option<MessageKind>,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Stats for a user, default when none were saved
    fn load_stats(&self, user_id: &PlayerId) -> Result<ProfileStats, StoreError>;

    fn save_stats(&self, user_id: &PlayerId, stats: &ProfileStats) -> Result<(), StoreError>;
}
