//! Multiplayer plumbing
//!
//! The hosted row store and its change feed are external services. This
//! module defines the interfaces the game needs from them (`RoomStore`,
//! `ChangeFeed`), an in-process implementation of both, the lobby operations
//! built on top, and the position sync adapter used by the frame loop.

pub mod feed;
pub mod lobby;
pub mod memory;
pub mod records;
pub mod store;
pub mod sync;

pub use feed::{ChangeEvent, ChangeFeed, FeedSender, Subscription};
pub use lobby::{Identity, LobbyError};
pub use memory::MemoryBackend;
pub use records::{
    ChatMessage, MessageKind, NewMessage, NewRoom, PlayerPatch, PlayerPosition, PlayerRecord,
    RoomPatch, RoomRecord, RoomStatus,
};
pub use store::{RoomStore, StoreError};
pub use sync::{PositionThrottle, RemotePlayer, SyncAdapter};
