//! Interaction rules: pickup, delivery, round quota and progression
//!
//! One state machine serves every mode. The differences between the
//! single-player campaign and multiplayer rooms are data in [`Rules`].

use serde::{Deserialize, Serialize};

use super::state::{FishState, GameEvent, GamePhase, GameState};

/// Points per fish counted
pub const FISH_POINTS: u64 = 100;
/// Points per second left on the clock when a campaign level is cleared
pub const TIME_BONUS_PER_SECOND: u64 = 10;

/// How touching a fish counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    /// Pick up one fish at a time and bring it to the post
    Carry,
    /// Touching a fish counts it immediately
    Direct,
}

/// How the next level is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    Sequential,
    Random,
}

/// When a round is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaRule {
    /// Every online player has a cumulative count >= the round number
    RoundNumber,
    /// Every fish in the level is done
    AllFish,
}

/// Rule set for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub collect_mode: CollectMode,
    pub progression: Progression,
    pub quota: QuotaRule,
    /// Round clock length
    pub round_seconds: u32,
    /// Pause between quota met and the next round (0 = immediate)
    pub advance_delay_secs: u32,
    /// Game is won after completing this many rounds
    pub max_rounds: Option<u32>,
}

impl Default for Rules {
    fn default() -> Self {
        Self::multiplayer()
    }
}

impl Rules {
    /// Campaign: touch fish to collect, clear every level in order
    pub fn single_player() -> Self {
        Self {
            collect_mode: CollectMode::Direct,
            progression: Progression::Sequential,
            quota: QuotaRule::AllFish,
            round_seconds: 90,
            advance_delay_secs: 0,
            max_rounds: None,
        }
    }

    /// Rooms: carry fish to the post, random level each round
    pub fn multiplayer() -> Self {
        Self {
            collect_mode: CollectMode::Carry,
            progression: Progression::Random,
            quota: QuotaRule::RoundNumber,
            round_seconds: 60,
            advance_delay_secs: 3,
            max_rounds: Some(5),
        }
    }
}

/// What the state machine needs to know about another player in the room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerProgress {
    pub online: bool,
    pub collected: u32,
}

/// Run pickup/delivery/collection for this tick, then check the quota.
pub fn resolve_interactions(
    state: &mut GameState,
    peers: &[PeerProgress],
    events: &mut Vec<GameEvent>,
) {
    if state.phase != GamePhase::Playing {
        return;
    }

    match state.rules.collect_mode {
        CollectMode::Carry => {
            events.extend(try_pickup(state));
            events.extend(try_deliver(state));
        }
        CollectMode::Direct => collect_touching(state, events),
    }

    check_progress(state, peers, events);
}

/// Pick up the first available fish we overlap, unless already carrying one.
pub fn try_pickup(state: &mut GameState) -> Option<GameEvent> {
    if state.is_carrying() {
        return None;
    }

    let body = state.player.bounds();
    let index = state
        .fish
        .iter()
        .position(|fish| fish.is_available() && body.intersects(&fish.rect))?;

    state.fish[index].state = FishState::Carried(state.local_id.clone());
    log::debug!("Picked up fish {}", index);
    Some(GameEvent::FishPickedUp { fish: index })
}

/// Hand the carried fish to the post. No-op unless carrying and touching it.
pub fn try_deliver(state: &mut GameState) -> Option<GameEvent> {
    let index = state.carried_fish()?;
    let goal = state.level().goal;
    if !state.player.bounds().intersects(&goal) {
        return None;
    }

    state.fish[index].state = FishState::Delivered;
    state.collected += 1;
    state.score += FISH_POINTS;
    log::debug!("Delivered fish {} (total {})", index, state.collected);
    Some(GameEvent::FishDelivered {
        fish: index,
        total: state.collected,
    })
}

/// Direct rules: count every available fish we overlap.
pub fn collect_touching(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let body = state.player.bounds();
    for index in 0..state.fish.len() {
        let fish = &mut state.fish[index];
        if fish.is_available() && body.intersects(&fish.rect) {
            fish.state = FishState::Collected;
            state.collected += 1;
            state.score += FISH_POINTS;
            events.push(GameEvent::FishCollected {
                fish: index,
                total: state.collected,
            });
        }
    }
}

/// Whether the current round's quota is satisfied
pub fn quota_met(state: &GameState, peers: &[PeerProgress]) -> bool {
    match state.rules.quota {
        QuotaRule::RoundNumber => {
            state.collected >= state.round
                && peers
                    .iter()
                    .filter(|peer| peer.online)
                    .all(|peer| peer.collected >= state.round)
        }
        QuotaRule::AllFish => state.fish_remaining() == 0,
    }
}

/// Complete the round if the quota is met
pub fn check_progress(state: &mut GameState, peers: &[PeerProgress], events: &mut Vec<GameEvent>) {
    if state.phase != GamePhase::Playing || !quota_met(state, peers) {
        return;
    }

    events.push(GameEvent::QuotaMet { round: state.round });
    if state.rules.quota == QuotaRule::AllFish {
        state.score += state.time_left as u64 * TIME_BONUS_PER_SECOND;
    }

    if is_final_round(state) {
        state.phase = GamePhase::Won;
        log::info!("Won on round {} with score {}", state.round, state.score);
        events.push(GameEvent::Won { score: state.score });
    } else if state.rules.advance_delay_secs == 0 {
        events.push(advance_round(state));
    } else {
        state.phase = GamePhase::RoundComplete {
            advance_in: state.rules.advance_delay_secs,
        };
    }
}

fn is_final_round(state: &GameState) -> bool {
    if state.rules.max_rounds.is_some_and(|max| state.round >= max) {
        return true;
    }
    state.rules.progression == Progression::Sequential
        && state.catalog.next_in_sequence(state.level_index).is_none()
}

/// Move to the next round: new level, fresh fish, no carry, full clock.
pub fn advance_round(state: &mut GameState) -> GameEvent {
    let next_level = match state.rules.progression {
        Progression::Sequential => state
            .catalog
            .next_in_sequence(state.level_index)
            .unwrap_or(0),
        Progression::Random => {
            let catalog = &state.catalog;
            catalog.random_index(&mut state.rng)
        }
    };

    let round = state.round + 1;
    state.enter_round(round, next_level);
    log::info!("Round {} on level {} ({})", round, next_level, state.level().name);
    GameEvent::RoundAdvanced {
        round,
        level: next_level,
    }
}

/// One second of wall-clock time passed.
pub fn on_timer_second(state: &mut GameState, events: &mut Vec<GameEvent>) {
    match state.phase {
        GamePhase::Playing => {
            state.time_left = state.time_left.saturating_sub(1);
            if state.time_left == 0 {
                state.phase = GamePhase::TimeUp;
                log::info!("Time up on round {} with score {}", state.round, state.score);
                events.push(GameEvent::TimeUp { score: state.score });
            }
        }
        GamePhase::RoundComplete { advance_in } => {
            if advance_in <= 1 {
                events.push(advance_round(state));
            } else {
                state.phase = GamePhase::RoundComplete {
                    advance_in: advance_in - 1,
                };
            }
        }
        _ => {}
    }
}

/// Follow a round change another client already committed to the room.
///
/// Newer rounds always win. For the same round a different level means a
/// concurrent advance was overwritten and we switch to the stored one.
pub fn adopt_round(state: &mut GameState, round: u32, level_index: usize) -> Option<GameEvent> {
    if state.phase.is_over() || state.phase == GamePhase::Waiting {
        return None;
    }

    let newer = round > state.round;
    let replaced = round == state.round && level_index != state.level_index;
    if !newer && !replaced {
        return None;
    }

    state.enter_round(round, level_index);
    log::info!("Following room to round {} on level {}", round, level_index);
    Some(GameEvent::RoundAdvanced {
        round,
        level: state.level_index,
    })
}

/// End the game from outside the tick (room timed out or completed elsewhere)
pub fn force_finish(state: &mut GameState, won: bool) -> Option<GameEvent> {
    if state.phase.is_over() || state.phase == GamePhase::Waiting {
        return None;
    }

    if won {
        state.phase = GamePhase::Won;
        Some(GameEvent::Won { score: state.score })
    } else {
        state.phase = GamePhase::TimeUp;
        Some(GameEvent::TimeUp { score: state.score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelCatalog;
    use crate::sim::state::{GameState, PlayerId};
    use glam::Vec2;

    fn playing(rules: Rules) -> GameState {
        let mut state = GameState::new(PlayerId::new("me"), rules, LevelCatalog::builtin(), 42);
        state.start(0);
        state
    }

    /// Put the cat on top of a rect
    fn stand_on(state: &mut GameState, rect: crate::sim::Rect) {
        state.player.pos = Vec2::new(rect.x, rect.y);
    }

    #[test]
    fn test_pickup_marks_carried() {
        let mut state = playing(Rules::multiplayer());
        let fish = state.fish[0].rect;
        stand_on(&mut state, fish);

        assert_eq!(try_pickup(&mut state), Some(GameEvent::FishPickedUp { fish: 0 }));
        assert!(state.fish[0].is_carried_by(&PlayerId::new("me")));
        // Counter only moves on delivery
        assert_eq!(state.collected, 0);
    }

    #[test]
    fn test_single_carry_limit() {
        let mut state = playing(Rules::multiplayer());
        let first = state.fish[0].rect;
        let second = state.fish[1].rect;
        stand_on(&mut state, first);
        try_pickup(&mut state);
        stand_on(&mut state, second);

        assert_eq!(try_pickup(&mut state), None);
        let me = PlayerId::new("me");
        assert_eq!(state.fish.iter().filter(|f| f.is_carried_by(&me)).count(), 1);
        assert!(state.fish[1].is_available());
    }

    #[test]
    fn test_delivery_without_fish_is_noop() {
        let mut state = playing(Rules::multiplayer());
        let goal = state.level().goal;
        stand_on(&mut state, goal);
        let fish_before = state.fish.clone();

        assert_eq!(try_deliver(&mut state), None);
        assert_eq!(state.fish, fish_before);
        assert_eq!(state.collected, 0);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_delivery_counts_once() {
        let mut state = playing(Rules::multiplayer());
        let fish = state.fish[0].rect;
        let goal = state.level().goal;
        stand_on(&mut state, fish);
        try_pickup(&mut state);
        stand_on(&mut state, goal);

        assert_eq!(
            try_deliver(&mut state),
            Some(GameEvent::FishDelivered { fish: 0, total: 1 })
        );
        assert_eq!(state.fish[0].state, FishState::Delivered);
        assert!(!state.is_carrying());
        // Still touching the post, nothing more to deliver
        assert_eq!(try_deliver(&mut state), None);
        assert_eq!(state.collected, 1);
    }

    #[test]
    fn test_direct_collect_at_fish_rect() {
        let mut state = playing(Rules::single_player());
        assert_eq!(state.fish[0].rect, crate::sim::Rect::new(130.0, 450.0, 25.0, 20.0));
        state.player.pos = Vec2::new(100.0, 430.0);

        let mut events = Vec::new();
        collect_touching(&mut state, &mut events);
        assert_eq!(events, vec![GameEvent::FishCollected { fish: 0, total: 1 }]);
        assert_eq!(state.fish[0].state, FishState::Collected);
        assert_eq!(state.collected, 1);

        // Touching it again does nothing
        collect_touching(&mut state, &mut events);
        assert_eq!(state.collected, 1);
    }

    #[test]
    fn test_quota_waits_for_online_peers() {
        let mut state = playing(Rules::multiplayer());
        state.collected = 1;
        let behind = PeerProgress { online: true, collected: 0 };
        let gone = PeerProgress { online: false, collected: 0 };
        let ahead = PeerProgress { online: true, collected: 3 };

        assert!(!quota_met(&state, &[behind]));
        assert!(quota_met(&state, &[gone]));
        assert!(quota_met(&state, &[ahead, gone]));
        state.collected = 0;
        assert!(!quota_met(&state, &[ahead]));
    }

    #[test]
    fn test_quota_schedules_advance_after_delay() {
        let mut state = playing(Rules::multiplayer());
        state.collected = 1;
        let mut events = Vec::new();
        check_progress(&mut state, &[], &mut events);
        assert_eq!(events, vec![GameEvent::QuotaMet { round: 1 }]);
        assert_eq!(state.phase, GamePhase::RoundComplete { advance_in: 3 });

        events.clear();
        on_timer_second(&mut state, &mut events);
        on_timer_second(&mut state, &mut events);
        assert!(events.is_empty());
        on_timer_second(&mut state, &mut events);
        assert!(matches!(events[0], GameEvent::RoundAdvanced { round: 2, .. }));
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_left, 60);
        assert!(state.fish.iter().all(|f| f.is_available()));
    }

    #[test]
    fn test_timer_runs_out() {
        let mut state = playing(Rules::multiplayer());
        assert_eq!(state.time_left, 60);
        let mut events = Vec::new();
        for _ in 0..59 {
            on_timer_second(&mut state, &mut events);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_left, 1);

        on_timer_second(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::TimeUp);
        assert_eq!(events, vec![GameEvent::TimeUp { score: 0 }]);

        // Quota met afterwards changes nothing
        state.collected = 5;
        events.clear();
        check_progress(&mut state, &[], &mut events);
        on_timer_second(&mut state, &mut events);
        assert!(events.is_empty());
        assert_eq!(state.round, 1);
    }

    #[test]
    fn test_campaign_clears_levels_in_order() {
        let mut state = playing(Rules::single_player());
        let mut events = Vec::new();
        for fish in &mut state.fish {
            fish.state = FishState::Collected;
        }
        state.time_left = 30;
        check_progress(&mut state, &[], &mut events);

        assert_eq!(state.level_index, 1);
        assert_eq!(state.round, 2);
        assert_eq!(state.score, 300);
        assert!(matches!(events[1], GameEvent::RoundAdvanced { round: 2, level: 1 }));
    }

    #[test]
    fn test_campaign_won_after_last_level() {
        let mut state = playing(Rules::single_player());
        let last = state.catalog().len() - 1;
        state.enter_round(last as u32 + 1, last);
        for fish in &mut state.fish {
            fish.state = FishState::Collected;
        }

        let mut events = Vec::new();
        check_progress(&mut state, &[], &mut events);
        assert_eq!(state.phase, GamePhase::Won);
        assert!(matches!(events.last(), Some(GameEvent::Won { .. })));
    }

    #[test]
    fn test_max_rounds_wins() {
        let mut state = playing(Rules::multiplayer());
        state.round = 5;
        state.collected = 5;
        let mut events = Vec::new();
        check_progress(&mut state, &[PeerProgress { online: true, collected: 5 }], &mut events);
        assert_eq!(state.phase, GamePhase::Won);
    }

    #[test]
    fn test_adopt_newer_round_only() {
        let mut state = playing(Rules::multiplayer());
        assert!(adopt_round(&mut state, 1, 0).is_none());
        assert_eq!(
            adopt_round(&mut state, 2, 3),
            Some(GameEvent::RoundAdvanced { round: 2, level: 3 })
        );
        assert_eq!(state.round, 2);
        assert!(adopt_round(&mut state, 1, 0).is_none());
        assert_eq!(state.level_index, 3);
    }

    #[test]
    fn test_rules_from_partial_json() {
        let rules: Rules = serde_json::from_str(r#"{"round_seconds": 30, "collect_mode": "direct"}"#).unwrap();
        assert_eq!(rules.round_seconds, 30);
        assert_eq!(rules.collect_mode, CollectMode::Direct);
        assert_eq!(rules.quota, QuotaRule::RoundNumber);
    }
}
