//! Level layouts
//!
//! A level is an immutable set of platforms, fish spawn rects, one scratching
//! post and a spawn point. Levels are grouped into a [`LevelCatalog`] that is
//! handed to the game explicitly; nothing here is global.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Fish collectible size (pixels)
pub const FISH_WIDTH: f32 = 25.0;
pub const FISH_HEIGHT: f32 = 20.0;

/// Scratching post size (pixels)
pub const POST_WIDTH: f32 = 40.0;
pub const POST_HEIGHT: f32 = 80.0;

/// Height of the ground strip every built-in level shares
const GROUND_HEIGHT: f32 = 40.0;
const GROUND_Y: f32 = WORLD_HEIGHT - GROUND_HEIGHT;

/// Static layout of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub platforms: Vec<Rect>,
    /// Fish spawn rectangles, in pickup order for display only
    pub fish: Vec<Rect>,
    /// The scratching post
    pub goal: Rect,
    /// Top-left spawn position for players
    pub spawn: Vec2,
}

impl Level {
    fn fish_at(x: f32, surface_y: f32) -> Rect {
        Rect::new(x, surface_y - FISH_HEIGHT, FISH_WIDTH, FISH_HEIGHT)
    }

    fn post_at(x: f32, surface_y: f32) -> Rect {
        Rect::new(x, surface_y - POST_HEIGHT, POST_WIDTH, POST_HEIGHT)
    }

    fn ground() -> Rect {
        Rect::new(0.0, GROUND_Y, WORLD_WIDTH, GROUND_HEIGHT)
    }
}

/// Ordered set of levels, never empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

#[derive(Debug, thiserror::Error)]
#[error("level catalog is empty")]
pub struct EmptyCatalog;

/// Wire shape checked before it becomes a `LevelCatalog`
#[derive(Deserialize)]
struct RawCatalog {
    levels: Vec<Level>,
}

impl TryFrom<RawCatalog> for LevelCatalog {
    type Error = EmptyCatalog;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.levels).ok_or(EmptyCatalog)
    }
}

impl LevelCatalog {
    /// Build a catalog; returns `None` for an empty list
    pub fn new(levels: Vec<Level>) -> Option<Self> {
        if levels.is_empty() {
            None
        } else {
            Some(Self { levels })
        }
    }

    /// Parse a catalog from JSON; an empty level list is rejected
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The levels shipped with the game
    pub fn builtin() -> Self {
        Self {
            levels: vec![kitchen(), rooftops(), bookshelf(), alley()],
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false, a catalog holds at least one level
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level by index, wrapping out-of-range indices
    pub fn get(&self, index: usize) -> &Level {
        &self.levels[index % self.levels.len()]
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Next index in campaign order, `None` after the last level
    pub fn next_in_sequence(&self, index: usize) -> Option<usize> {
        let next = index + 1;
        (next < self.levels.len()).then_some(next)
    }

    /// Uniform random pick. Repeats are allowed.
    pub fn random_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.random_range(0..self.levels.len())
    }
}

fn kitchen() -> Level {
    Level {
        name: "Kitchen".to_string(),
        platforms: vec![
            Level::ground(),
            Rect::new(50.0, 470.0, 200.0, 20.0),
            Rect::new(330.0, 380.0, 180.0, 20.0),
            Rect::new(580.0, 280.0, 180.0, 20.0),
        ],
        fish: vec![
            Level::fish_at(130.0, 470.0),
            Level::fish_at(400.0, 380.0),
            Level::fish_at(650.0, 280.0),
            Level::fish_at(450.0, GROUND_Y),
        ],
        goal: Level::post_at(720.0, GROUND_Y),
        spawn: Vec2::new(100.0, 300.0),
    }
}

fn rooftops() -> Level {
    Level {
        name: "Rooftops".to_string(),
        platforms: vec![
            Level::ground(),
            Rect::new(0.0, 480.0, 160.0, 20.0),
            Rect::new(220.0, 400.0, 160.0, 20.0),
            Rect::new(440.0, 320.0, 160.0, 20.0),
            Rect::new(640.0, 240.0, 160.0, 20.0),
        ],
        fish: vec![
            Level::fish_at(260.0, 400.0),
            Level::fish_at(500.0, 320.0),
            Level::fish_at(700.0, 240.0),
            Level::fish_at(600.0, GROUND_Y),
        ],
        goal: Level::post_at(110.0, 480.0),
        spawn: Vec2::new(100.0, 300.0),
    }
}

fn bookshelf() -> Level {
    Level {
        name: "Bookshelf".to_string(),
        platforms: vec![
            Level::ground(),
            Rect::new(60.0, 460.0, 260.0, 16.0),
            Rect::new(60.0, 360.0, 260.0, 16.0),
            Rect::new(60.0, 260.0, 260.0, 16.0),
            Rect::new(480.0, 420.0, 240.0, 16.0),
            Rect::new(480.0, 320.0, 240.0, 16.0),
        ],
        fish: vec![
            Level::fish_at(250.0, 360.0),
            Level::fish_at(150.0, 260.0),
            Level::fish_at(600.0, 320.0),
            Level::fish_at(520.0, 420.0),
        ],
        goal: Level::post_at(380.0, GROUND_Y),
        spawn: Vec2::new(100.0, 300.0),
    }
}

fn alley() -> Level {
    Level {
        name: "Alley".to_string(),
        platforms: vec![
            Level::ground(),
            Rect::new(0.0, 470.0, 140.0, 20.0),
            Rect::new(200.0, 390.0, 120.0, 20.0),
            Rect::new(380.0, 470.0, 120.0, 20.0),
            Rect::new(540.0, 380.0, 120.0, 20.0),
            Rect::new(680.0, 300.0, 120.0, 20.0),
        ],
        fish: vec![
            Level::fish_at(240.0, 390.0),
            Level::fish_at(420.0, 470.0),
            Level::fish_at(740.0, 300.0),
            Level::fish_at(300.0, GROUND_Y),
        ],
        goal: Level::post_at(580.0, 380.0),
        spawn: Vec2::new(100.0, 300.0),
    }
}
