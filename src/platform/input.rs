//! Keyboard and touch-button input
//!
//! Key-down/key-up events maintain a held set. Horizontal direction is read
//! from the set every tick; jump is edge-triggered so holding the key (or OS
//! auto-repeat) never queues a second jump.

use std::collections::HashSet;

use crate::consts::TAP_DURATION_MS;
use crate::sim::{Facing, TickInput};

/// A game control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value to a control
    pub fn from_dom(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            "ArrowUp" | "w" | "W" | " " | "Spacebar" => Some(Key::Jump),
            _ => None,
        }
    }

    /// Map an on-screen button id to a control
    pub fn from_button(id: &str) -> Option<Self> {
        match id {
            "btn-left" => Some(Key::Left),
            "btn-right" => Some(Key::Right),
            "btn-jump" => Some(Key::Jump),
            _ => None,
        }
    }
}

/// A tap that will release its key at `release_at` (ms)
#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    key: Key,
    release_at: f64,
}

/// Held keys plus edge state, sampled once per tick
#[derive(Debug, Default)]
pub struct InputController {
    held: HashSet<Key>,
    jump_pending: bool,
    releases: Vec<PendingRelease>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press a control. Repeats of an already held key are ignored.
    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) && key == Key::Jump {
            self.jump_pending = true;
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
        self.releases.retain(|pending| pending.key != key);
    }

    /// Handle a DOM key-down. Returns true when the key is a game control and
    /// the harness should suppress its default browser action.
    pub fn key_down(&mut self, dom_key: &str) -> bool {
        match Key::from_dom(dom_key) {
            Some(key) => {
                self.press(key);
                true
            }
            None => false,
        }
    }

    /// Handle a DOM key-up; same return contract as `key_down`
    pub fn key_up(&mut self, dom_key: &str) -> bool {
        match Key::from_dom(dom_key) {
            Some(key) => {
                self.release(key);
                true
            }
            None => false,
        }
    }

    /// Touch button: press now, release `TAP_DURATION_MS` later
    pub fn tap(&mut self, key: Key, now_ms: f64) {
        self.press(key);
        let release_at = now_ms + TAP_DURATION_MS;
        match self.releases.iter_mut().find(|pending| pending.key == key) {
            Some(pending) => pending.release_at = release_at,
            None => self.releases.push(PendingRelease { key, release_at }),
        }
    }

    /// Release taps whose duration has elapsed
    pub fn expire(&mut self, now_ms: f64) {
        let due: Vec<Key> = self
            .releases
            .iter()
            .filter(|pending| pending.release_at <= now_ms)
            .map(|pending| pending.key)
            .collect();
        for key in due {
            self.release(key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Drop everything (window blur, game restart)
    pub fn clear(&mut self) {
        self.held.clear();
        self.releases.clear();
        self.jump_pending = false;
    }

    /// Read this tick's input. Consumes a pending jump.
    pub fn sample(&mut self) -> TickInput {
        let horizontal = if self.held.contains(&Key::Left) {
            Some(Facing::Left)
        } else if self.held.contains(&Key::Right) {
            Some(Facing::Right)
        } else {
            None
        };

        TickInput {
            horizontal,
            jump: std::mem::take(&mut self.jump_pending),
        }
    }
}
