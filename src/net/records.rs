//! Row types shared with the hosted store
//!
//! Field names match the table columns (snake_case JSON).

use serde::{Deserialize, Serialize};

use crate::sim::{AnimState, Facing, GamePhase, PlayerId};

/// Room lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Completed,
}

impl RoomStatus {
    /// Room status that mirrors a local game phase
    pub fn for_phase(phase: GamePhase) -> Self {
        match phase {
            GamePhase::Waiting | GamePhase::TimeUp => RoomStatus::Waiting,
            GamePhase::Playing | GamePhase::RoundComplete { .. } => RoomStatus::Playing,
            GamePhase::Won => RoomStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: String,
    /// Short shareable join code
    pub code: String,
    pub host_id: PlayerId,
    pub status: RoomStatus,
    /// 1-based once playing, 0 while waiting for the first start
    pub round: u32,
    pub level_index: usize,
    pub max_players: u32,
}

/// Insert payload for a room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRoom {
    pub code: String,
    pub host_id: PlayerId,
    pub max_players: u32,
}

/// Partial room update; `None` leaves the column alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_index: Option<usize>,
}

impl RoomPatch {
    pub fn apply(&self, room: &mut RoomRecord) {
        if let Some(status) = self.status {
            room.status = status;
        }
        if let Some(round) = self.round {
            room.round = round;
        }
        if let Some(level_index) = self.level_index {
            room.level_index = level_index;
        }
    }
}

/// Last reported body state of a player
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub anim: AnimState,
    pub facing: Facing,
    pub carrying: bool,
    /// Sender clock when the report was taken (ms)
    pub sent_at_ms: f64,
}

/// One player in one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub room_id: String,
    pub user_id: PlayerId,
    pub display_name: String,
    #[serde(flatten)]
    pub position: PlayerPosition,
    /// Cumulative fish count for the session
    pub collected: u32,
    pub online: bool,
}

impl PlayerRecord {
    pub fn joining(room_id: &str, user_id: PlayerId, display_name: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            user_id,
            display_name: display_name.to_string(),
            position: PlayerPosition::default(),
            collected: 0,
            online: true,
        }
    }
}

/// Partial player update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerPatch {
    #[serde(flatten)]
    pub position: Option<PlayerPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

impl PlayerPatch {
    pub fn position(position: PlayerPosition) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn collected(collected: u32) -> Self {
        Self {
            collected: Some(collected),
            ..Default::default()
        }
    }

    pub fn online(online: bool) -> Self {
        Self {
            online: Some(online),
            ..Default::default()
        }
    }

    pub fn apply(&self, player: &mut PlayerRecord) {
        if let Some(position) = self.position {
            player.position = position;
        }
        if let Some(collected) = self.collected {
            player.collected = collected;
        }
        if let Some(online) = self.online {
            player.online = online;
        }
    }
}

/// Chat lines and game event notices share one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Chat,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub room_id: String,
    pub user_id: PlayerId,
    pub display_name: String,
    pub kind: MessageKind,
    pub body: String,
}

/// Insert payload for a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMessage {
    pub room_id: String,
    pub user_id: PlayerId,
    pub display_name: String,
    pub kind: MessageKind,
    pub body: String,
}
