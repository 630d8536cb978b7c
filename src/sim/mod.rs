//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering,
//! storage and platform dependencies:
//! - One tick per host frame, constants are per-frame
//! - Seeded RNG only (level selection)
//! - Level data is passed in, never global

pub mod collision;
pub mod level;
pub mod physics;
pub mod rules;
pub mod state;
pub mod tick;

pub use collision::Rect;
pub use level::{Level, LevelCatalog};
pub use physics::{StepOutcome, step_body};
pub use rules::{CollectMode, PeerProgress, Progression, QuotaRule, Rules};
pub use state::{
    AnimState, Facing, Fish, FishState, GameEvent, GamePhase, GameState, Player, PlayerId,
};
pub use tick::{TickInput, tick};
