//! Simulation tick
//!
//! One call per rendered frame: move the local cat, then run the interaction
//! rules. Remote players are not simulated here.

use super::physics::step_body;
use super::rules::{PeerProgress, resolve_interactions};
use super::state::{Facing, GameEvent, GameState};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Held direction, left wins when both are held
    pub horizontal: Option<Facing>,
    /// A fresh jump press this tick
    pub jump: bool,
}

impl TickInput {
    pub fn left() -> Self {
        Self {
            horizontal: Some(Facing::Left),
            jump: false,
        }
    }

    pub fn right() -> Self {
        Self {
            horizontal: Some(Facing::Right),
            jump: false,
        }
    }

    pub fn jump() -> Self {
        Self {
            horizontal: None,
            jump: true,
        }
    }
}

/// Advance the game state by one frame.
///
/// `peers` carries the last known progress of the other players in the room
/// (empty for single player). Returns what happened for the caller to report.
pub fn tick(state: &mut GameState, input: &TickInput, peers: &[PeerProgress]) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if !state.phase.simulates() {
        return events;
    }

    state.time_ticks += 1;

    let level = state.catalog.get(state.level_index);
    let outcome = step_body(&mut state.player, input, &level.platforms);
    if outcome.jumped {
        events.push(GameEvent::Jumped);
    }
    if outcome.respawned {
        events.push(GameEvent::Respawned);
    }

    resolve_interactions(state, peers, &mut events);
    events
}
