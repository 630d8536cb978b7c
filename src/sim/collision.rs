//! Axis-aligned boxes and platform collision
//!
//! Only top landings are resolved. A body that hits a platform from the side
//! or from below passes through it; levels are designed around that.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Slack when comparing the previous feet position against a surface
const LANDING_EPSILON: f32 = 0.001;

/// Axis-aligned rectangle, top-left origin, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Whether the horizontal extents overlap (ignores y)
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left() < other.right() && self.right() > other.left()
    }
}

/// Snap a falling body onto the first platform it landed on this tick.
///
/// `pos` is the post-move position and `vel` the velocity used for the move.
/// A landing requires overlap, downward motion, and feet at or above the
/// platform top before the move. Returns the surface y when a landing happened.
pub fn resolve_top_landing(
    pos: &mut Vec2,
    vel: &mut Vec2,
    size: Vec2,
    platforms: &[Rect],
) -> Option<f32> {
    if vel.y <= 0.0 {
        return None;
    }

    for platform in platforms {
        let body = Rect::from_pos_size(*pos, size);
        if !body.intersects(platform) {
            continue;
        }

        let previous_bottom = pos.y - vel.y + size.y;
        if previous_bottom <= platform.top() + LANDING_EPSILON {
            pos.y = platform.top() - size.y;
            vel.y = 0.0;
            return Some(platform.top());
        }
    }

    None
}

/// Discrete grounded test: feet within `tolerance` of a platform top (with
/// horizontal overlap) or of the world floor.
pub fn is_grounded(body: &Rect, platforms: &[Rect], floor_y: f32, tolerance: f32) -> bool {
    if (body.bottom() - floor_y).abs() <= tolerance {
        return true;
    }

    platforms.iter().any(|platform| {
        body.overlaps_horizontally(platform) && (body.bottom() - platform.top()).abs() <= tolerance
    })
}
