//! Lobby operations
//!
//! Rooms are found by a short join code. Everything here is a thin sequence of
//! store calls; the frame loop never waits on them.

use rand::Rng;

use super::records::{
    ChatMessage, MessageKind, NewMessage, NewRoom, PlayerPatch, PlayerRecord, RoomPatch,
    RoomRecord, RoomStatus,
};
use super::store::{RoomStore, StoreError};
use crate::consts::MAX_PLAYERS;
use crate::sim::{LevelCatalog, PlayerId};

/// Join code characters (no 0/O or 1/I)
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;
/// Give up generating a unique code after this many collisions
pub const MAX_CODE_ATTEMPTS: usize = 10;
/// Longer chat lines are cut
pub const MAX_CHAT_LEN: usize = 200;

/// Who is playing, as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: PlayerId,
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: PlayerId::new(user_id),
            display_name: display_name.into(),
        }
    }
}

/// Lobby errors
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("No room with code {0}")]
    RoomNotFound(String),

    #[error("Room {code} is full ({capacity} players)")]
    RoomFull { code: String, capacity: u32 },

    #[error("Not a member of this room")]
    NotInRoom,

    #[error("Could not find a free room code")]
    CodeSpaceExhausted,

    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Random join code
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are typed by people; accept lowercase and stray spaces
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Create a room with a fresh code and join it as host
pub fn create_room<R: Rng + ?Sized>(
    store: &dyn RoomStore,
    identity: &Identity,
    rng: &mut R,
) -> Result<RoomRecord, LobbyError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_room_code(rng);
        if store.room_by_code(&code)?.is_some() {
            continue;
        }

        let created = store.create_room(NewRoom {
            code,
            host_id: identity.user_id.clone(),
            max_players: MAX_PLAYERS,
        });
        let room = match created {
            Ok(room) => room,
            // Lost a race for the code
            Err(StoreError::Conflict(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        store.upsert_player(&PlayerRecord::joining(
            &room.id,
            identity.user_id.clone(),
            &identity.display_name,
        ))?;
        log::info!("Created room {} ({})", room.code, room.id);
        return Ok(room);
    }

    Err(LobbyError::CodeSpaceExhausted)
}

/// Join by code. Rejoining a room we were in keeps our count.
pub fn join_room(
    store: &dyn RoomStore,
    identity: &Identity,
    code: &str,
) -> Result<RoomRecord, LobbyError> {
    let code = normalize_code(code);
    let room = store
        .room_by_code(&code)?
        .ok_or_else(|| LobbyError::RoomNotFound(code.clone()))?;

    let players = store.players(&room.id)?;
    let existing = players
        .iter()
        .find(|player| player.user_id == identity.user_id);
    let online_others = players
        .iter()
        .filter(|player| player.online && player.user_id != identity.user_id)
        .count() as u32;
    if online_others >= room.max_players {
        return Err(LobbyError::RoomFull {
            code,
            capacity: room.max_players,
        });
    }

    let mut record =
        PlayerRecord::joining(&room.id, identity.user_id.clone(), &identity.display_name);
    if let Some(previous) = existing {
        record.collected = previous.collected;
    }
    store.upsert_player(&record)?;
    log::info!("{} joined room {}", identity.display_name, room.code);
    Ok(room)
}

/// Join by code, or start a new room when that one is full
pub fn join_or_create<R: Rng + ?Sized>(
    store: &dyn RoomStore,
    identity: &Identity,
    code: &str,
    rng: &mut R,
) -> Result<RoomRecord, LobbyError> {
    match join_room(store, identity, code) {
        Err(LobbyError::RoomFull { code, .. }) => {
            log::info!("Room {} is full, creating a new one", code);
            create_room(store, identity, rng)
        }
        other => other,
    }
}

/// Join any waiting room with space, else create one
pub fn quick_join<R: Rng + ?Sized>(
    store: &dyn RoomStore,
    identity: &Identity,
    rng: &mut R,
) -> Result<RoomRecord, LobbyError> {
    for room in store.list_rooms(RoomStatus::Waiting)? {
        match join_room(store, identity, &room.code) {
            Ok(room) => return Ok(room),
            Err(LobbyError::RoomFull { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    create_room(store, identity, rng)
}

/// Mark ourselves offline and tell the room
pub fn leave_room(
    store: &dyn RoomStore,
    identity: &Identity,
    room_id: &str,
) -> Result<(), LobbyError> {
    match store.update_player(room_id, &identity.user_id, &PlayerPatch::online(false)) {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => return Err(LobbyError::NotInRoom),
        Err(e) => return Err(e.into()),
    }
    post_event(
        store,
        identity,
        room_id,
        &format!("{} left the room", identity.display_name),
    )?;
    log::info!("{} left room {}", identity.display_name, room_id);
    Ok(())
}

/// Move a waiting room into round 1 on a random level
pub fn start_game<R: Rng + ?Sized>(
    store: &dyn RoomStore,
    room_id: &str,
    catalog: &LevelCatalog,
    rng: &mut R,
) -> Result<RoomRecord, LobbyError> {
    let level_index = catalog.random_index(rng);
    let room = store.update_room(
        room_id,
        &RoomPatch {
            status: Some(RoomStatus::Playing),
            round: Some(1),
            level_index: Some(level_index),
        },
    )?;
    log::info!("Room {} started on level {}", room.code, level_index);
    Ok(room)
}

/// Post a chat line
pub fn send_chat(
    store: &dyn RoomStore,
    identity: &Identity,
    room_id: &str,
    body: &str,
) -> Result<ChatMessage, LobbyError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(LobbyError::EmptyMessage);
    }
    let body: String = body.chars().take(MAX_CHAT_LEN).collect();
    Ok(store.append_message(NewMessage {
        room_id: room_id.to_string(),
        user_id: identity.user_id.clone(),
        display_name: identity.display_name.clone(),
        kind: MessageKind::Chat,
        body,
    })?)
}

/// Post a game event notice
pub fn post_event(
    store: &dyn RoomStore,
    identity: &Identity,
    room_id: &str,
    body: &str,
) -> Result<ChatMessage, StoreError> {
    store.append_message(NewMessage {
        room_id: room_id.to_string(),
        user_id: identity.user_id.clone(),
        display_name: identity.display_name.clone(),
        kind: MessageKind::Event,
        body: body.to_string(),
    })
}

/// Chat lines only, oldest first
pub fn chat_history(store: &dyn RoomStore, room_id: &str) -> Result<Vec<ChatMessage>, LobbyError> {
    Ok(store.messages(room_id, Some(MessageKind::Chat))?)
}
