//! Game state and core simulation types
//!
//! `GameState` is owned by the frame loop and mutated only by `tick` and the
//! rule functions. The UI gets a copy through the session snapshot.

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::level::{Level, LevelCatalog};
use super::rules::Rules;
use crate::consts::{CAT_HEIGHT, CAT_WIDTH};

/// Stable player identity, issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Animation state, derived from motion each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimState {
    #[default]
    Idle,
    Walk,
    Jump,
}

/// Which way the cat is looking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// A cat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub anim: AnimState,
    pub facing: Facing,
    /// Animation frame counter (wraps)
    pub frame: u32,
    /// Where falling out of the world puts us back
    pub spawn: Vec2,
}

impl Player {
    pub fn new(id: PlayerId, spawn: Vec2) -> Self {
        Self {
            id,
            pos: spawn,
            vel: Vec2::ZERO,
            size: Vec2::new(CAT_WIDTH, CAT_HEIGHT),
            anim: AnimState::Idle,
            facing: Facing::Right,
            frame: 0,
            spawn,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Back to the spawn point, at rest
    pub fn respawn(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.anim = AnimState::Idle;
    }

    /// Move to a new level's spawn
    pub fn reset_to(&mut self, spawn: Vec2) {
        self.spawn = spawn;
        self.respawn();
    }
}

/// Lifecycle of one fish. Never moves backwards within a level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FishState {
    #[default]
    Available,
    /// Picked up, waiting to be brought to the post (carry rules)
    Carried(PlayerId),
    /// Brought to the post (carry rules)
    Delivered,
    /// Touched and counted on the spot (direct rules)
    Collected,
}

/// A fish collectible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fish {
    pub rect: Rect,
    pub state: FishState,
}

impl Fish {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            state: FishState::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == FishState::Available
    }

    pub fn is_carried_by(&self, id: &PlayerId) -> bool {
        matches!(&self.state, FishState::Carried(holder) if holder == id)
    }

    /// Delivered or collected
    pub fn is_done(&self) -> bool {
        matches!(self.state, FishState::Delivered | FishState::Collected)
    }
}

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// In the lobby, nothing simulates
    Waiting,
    /// Active round
    Playing,
    /// Quota met, next round starts after `advance_in` timer seconds
    RoundComplete { advance_in: u32 },
    /// Campaign finished or final round completed
    Won,
    /// Round timer ran out with the quota unmet
    TimeUp,
}

impl GamePhase {
    /// Whether the cat moves this phase
    pub fn simulates(&self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::RoundComplete { .. })
    }

    pub fn is_over(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::TimeUp)
    }
}

/// Things that happened during a tick or timer step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    /// Fell out of the world and was put back at spawn
    Respawned,
    FishPickedUp { fish: usize },
    /// Direct rules: fish counted on touch
    FishCollected { fish: usize, total: u32 },
    /// Carry rules: fish brought to the post
    FishDelivered { fish: usize, total: u32 },
    /// Everyone reached the round quota
    QuotaMet { round: u32 },
    RoundAdvanced { round: u32, level: usize },
    Won { score: u64 },
    TimeUp { score: u64 },
}

/// Complete simulation state for one client
#[derive(Debug, Clone)]
pub struct GameState {
    pub rules: Rules,
    pub(crate) catalog: LevelCatalog,
    /// Local player identity
    pub local_id: PlayerId,
    /// Index into the catalog
    pub level_index: usize,
    /// 1-based round (campaign: level number)
    pub round: u32,
    pub phase: GamePhase,
    /// Seconds left on the round clock
    pub time_left: u32,
    pub player: Player,
    pub fish: Vec<Fish>,
    /// Cumulative fish counted for the local player
    pub collected: u32,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a waiting game on the first catalog level
    pub fn new(local_id: PlayerId, rules: Rules, catalog: LevelCatalog, seed: u64) -> Self {
        let level = catalog.get(0);
        let player = Player::new(local_id.clone(), level.spawn);
        let fish = level.fish.iter().copied().map(Fish::new).collect();
        let time_left = rules.round_seconds;

        Self {
            rules,
            catalog,
            local_id,
            level_index: 0,
            round: 0,
            phase: GamePhase::Waiting,
            time_left,
            player,
            fish,
            collected: 0,
            score: 0,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Begin round 1 on the given level (clears counters)
    pub fn start(&mut self, level_index: usize) {
        self.collected = 0;
        self.score = 0;
        self.enter_round(1, level_index);
        log::info!(
            "Game started on level {} ({})",
            self.level_index,
            self.level().name
        );
    }

    /// Load a level and begin a fresh round clock
    pub(crate) fn enter_round(&mut self, round: u32, level_index: usize) {
        self.round = round;
        self.load_level(level_index);
        self.time_left = self.rules.round_seconds;
        self.phase = GamePhase::Playing;
    }

    /// Reset fish and player for a level
    pub fn load_level(&mut self, level_index: usize) {
        self.level_index = level_index % self.catalog.len();
        let level = self.catalog.get(self.level_index);
        self.fish = level.fish.iter().copied().map(Fish::new).collect();
        self.player.reset_to(level.spawn);
    }

    pub fn level(&self) -> &Level {
        self.catalog.get(self.level_index)
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Index of the fish the local player holds
    pub fn carried_fish(&self) -> Option<usize> {
        self.fish
            .iter()
            .position(|fish| fish.is_carried_by(&self.local_id))
    }

    pub fn is_carrying(&self) -> bool {
        self.carried_fish().is_some()
    }

    /// Fish not yet delivered or collected
    pub fn fish_remaining(&self) -> usize {
        self.fish.iter().filter(|fish| !fish.is_done()).count()
    }
}
