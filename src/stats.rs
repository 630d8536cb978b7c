//! Profile statistics
//!
//! Simple counters finalized at the end of every game. Persisted to
//! LocalStorage, and to the room store when one is attached.

use serde::{Deserialize, Serialize};

/// Outcome of one finished game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub score: u64,
    /// Fish counted during the game
    pub fish: u32,
    /// Round (or campaign level) reached
    pub round: u32,
    pub won: bool,
}

/// Lifetime counters for one player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileStats {
    pub games_played: u32,
    pub fish_collected: u64,
    pub wins: u32,
    pub best_score: u64,
    pub best_round: u32,
}

impl ProfileStats {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "kitty_courier_stats";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished game in. Returns true on a new best score.
    pub fn record(&mut self, summary: &GameSummary) -> bool {
        self.games_played += 1;
        self.fish_collected += summary.fish as u64;
        if summary.won {
            self.wins += 1;
        }
        self.best_round = self.best_round.max(summary.round);

        let new_best = summary.score > self.best_score;
        if new_best {
            self.best_score = summary.score;
        }
        new_best
    }

    /// Share of games won, 0.0 with no games
    pub fn win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f32 / self.games_played as f32
        }
    }

    /// Load stats from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(stats) = serde_json::from_str::<ProfileStats>(&json) {
                    log::info!("Loaded stats ({} games)", stats.games_played);
                    return stats;
                }
            }
        }

        log::info!("No stats found, starting fresh");
        Self::new()
    }

    /// Save stats to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Stats saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut stats = ProfileStats::new();
        let lost = GameSummary { score: 300, fish: 3, round: 2, won: false };
        let won = GameSummary { score: 250, fish: 4, round: 5, won: true };

        assert!(stats.record(&lost));
        assert!(!stats.record(&won));
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.fish_collected, 7);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.best_score, 300);
        assert_eq!(stats.best_round, 5);
        assert!((stats.win_rate() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zero_games_win_rate() {
        assert_eq!(ProfileStats::new().win_rate(), 0.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let stats: ProfileStats = serde_json::from_str(r#"{"wins": 2}"#).unwrap();
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.games_played, 0);
    }
}
