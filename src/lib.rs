//! Kitty Courier - collect fish, deliver them to the scratching post
//!
//! Core modules:
//! - `sim`: Per-frame simulation (physics, interactions, round state)
//! - `platform`: Browser input mapping
//! - `net`: Room storage, change feed, lobby, position sync
//! - `session`: The frame loop that ties everything together
//! - `renderer`: WebGPU rendering pipeline

pub mod audio;
pub mod net;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod stats;

pub use session::{FrameSnapshot, Hud, LoopHandle, Mailbox, Message, Session};
pub use settings::Settings;
pub use stats::ProfileStats;

/// Game configuration constants
///
/// Velocities and accelerations are per host frame, not per second.
pub mod consts {
    /// World dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Cat bounding box (pixels)
    pub const CAT_WIDTH: f32 = 40.0;
    pub const CAT_HEIGHT: f32 = 40.0;

    /// Downward acceleration added every tick
    pub const GRAVITY: f32 = 0.6;
    /// Horizontal speed while a direction is held
    pub const MOVE_SPEED: f32 = 5.0;
    /// Vertical impulse on jump (negative is up)
    pub const JUMP_FORCE: f32 = -14.0;
    /// Horizontal decay per tick with no input
    pub const FRICTION: f32 = 0.8;
    /// Horizontal speed below which friction snaps to zero
    pub const REST_SPEED: f32 = 0.01;

    /// Max gap between feet and a surface that still counts as grounded
    pub const GROUND_TOLERANCE: f32 = 5.0;
    /// Jumps are refused while |vy| is at or above this
    pub const JUMP_VY_THRESHOLD: f32 = 1.0;

    /// Minimum spacing between outbound position reports (ms)
    pub const SYNC_INTERVAL_MS: f64 = 100.0;
    /// How long a touch button stays pressed after a tap (ms)
    pub const TAP_DURATION_MS: f64 = 100.0;
    /// Round clock resolution (ms)
    pub const TIMER_INTERVAL_MS: u32 = 1000;

    /// Default room capacity
    pub const MAX_PLAYERS: u32 = 4;
}
