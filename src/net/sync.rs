//! Remote sync adapter
//!
//! Outbound: the local cat's body state, throttled to one report per
//! `SYNC_INTERVAL_MS`. Inbound: row notifications overwrite the cached copy of
//! every other player in the room. No interpolation.

use std::collections::BTreeMap;

use glam::Vec2;

use super::feed::ChangeEvent;
use super::records::{PlayerPosition, PlayerRecord};
use crate::consts::SYNC_INTERVAL_MS;
use crate::sim::{AnimState, Facing, PeerProgress, Player, PlayerId};

/// Drops reports that come sooner than `interval_ms` after the last accepted one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionThrottle {
    interval_ms: f64,
    last_sent: Option<f64>,
}

impl Default for PositionThrottle {
    fn default() -> Self {
        Self::new(SYNC_INTERVAL_MS)
    }
}

impl PositionThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_sent: None,
        }
    }

    /// Accept (and remember) a report at `now_ms`, or reject it
    pub fn try_acquire(&mut self, now_ms: f64) -> bool {
        match self.last_sent {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_sent = Some(now_ms);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

/// Cached copy of another player's last row
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub id: PlayerId,
    pub name: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub anim: AnimState,
    pub facing: Facing,
    /// Holding a fish (display only)
    pub carrying: bool,
    pub collected: u32,
    /// Sender clock of the position above
    pub sent_at_ms: f64,
}

impl RemotePlayer {
    fn from_record(record: &PlayerRecord) -> Self {
        let position = &record.position;
        Self {
            id: record.user_id.clone(),
            name: record.display_name.clone(),
            pos: Vec2::new(position.x, position.y),
            vel: Vec2::new(position.vx, position.vy),
            anim: position.anim,
            facing: position.facing,
            carrying: position.carrying,
            collected: record.collected,
            sent_at_ms: position.sent_at_ms,
        }
    }
}

/// Per-room sync state for one client
#[derive(Debug, Clone)]
pub struct SyncAdapter {
    local_id: PlayerId,
    throttle: PositionThrottle,
    remotes: BTreeMap<PlayerId, RemotePlayer>,
}

impl SyncAdapter {
    pub fn new(local_id: PlayerId) -> Self {
        Self::with_throttle(local_id, PositionThrottle::default())
    }

    pub fn with_throttle(local_id: PlayerId, throttle: PositionThrottle) -> Self {
        Self {
            local_id,
            throttle,
            remotes: BTreeMap::new(),
        }
    }

    /// Position report for the local cat, if the throttle allows one now
    pub fn outbound(&mut self, player: &Player, carrying: bool, now_ms: f64) -> Option<PlayerPosition> {
        if !self.throttle.try_acquire(now_ms) {
            return None;
        }
        Some(PlayerPosition {
            x: player.pos.x,
            y: player.pos.y,
            vx: player.vel.x,
            vy: player.vel.y,
            anim: player.anim,
            facing: player.facing,
            carrying,
            sent_at_ms: now_ms,
        })
    }

    /// Replace the cache with a full roster read
    pub fn seed(&mut self, players: &[PlayerRecord]) {
        self.remotes.clear();
        for record in players {
            self.apply_record(record);
        }
    }

    /// Merge one notification. Returns true when the remote cache changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::PlayerUpserted(record) => self.apply_record(record),
            ChangeEvent::PlayerDeleted { user_id, .. } => self.remotes.remove(user_id).is_some(),
            ChangeEvent::RoomUpdated(_) | ChangeEvent::MessageAppended(_) => false,
        }
    }

    fn apply_record(&mut self, record: &PlayerRecord) -> bool {
        if record.user_id == self.local_id {
            return false;
        }
        if !record.online {
            let removed = self.remotes.remove(&record.user_id).is_some();
            if removed {
                log::debug!("{} went offline", record.display_name);
            }
            return removed;
        }
        let fresh = RemotePlayer::from_record(record);
        match self.remotes.get_mut(&record.user_id) {
            // Redelivered older row: keep the newer position, take the count
            Some(cached) if fresh.sent_at_ms < cached.sent_at_ms => {
                let changed = cached.collected != fresh.collected || cached.name != fresh.name;
                cached.collected = fresh.collected;
                cached.name = fresh.name;
                changed
            }
            Some(cached) => {
                *cached = fresh;
                true
            }
            None => {
                self.remotes.insert(record.user_id.clone(), fresh);
                true
            }
        }
    }

    /// Counts of everyone else, for the round quota
    pub fn peers(&self) -> Vec<PeerProgress> {
        self.remotes
            .values()
            .map(|remote| PeerProgress {
                online: true,
                collected: remote.collected,
            })
            .collect()
    }

    pub fn remotes(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.remotes.values()
    }

    pub fn remote(&self, id: &PlayerId) -> Option<&RemotePlayer> {
        self.remotes.get(id)
    }

    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, x: f32, y: f32) -> PlayerRecord {
        let mut record = PlayerRecord::joining("room-1", PlayerId::new(id), id);
        record.position.x = x;
        record.position.y = y;
        record
    }

    fn sent_at(mut record: PlayerRecord, sent_at_ms: f64) -> PlayerRecord {
        record.position.sent_at_ms = sent_at_ms;
        record
    }

    #[test]
    fn test_throttle_spacing() {
        let mut throttle = PositionThrottle::new(100.0);
        assert!(throttle.try_acquire(0.0));
        assert!(!throttle.try_acquire(16.0));
        assert!(!throttle.try_acquire(99.9));
        assert!(throttle.try_acquire(100.0));
        assert!(!throttle.try_acquire(150.0));
    }

    #[test]
    fn test_outbound_report_fields() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        let mut player = Player::new(PlayerId::new("me"), Vec2::new(10.0, 20.0));
        player.vel = Vec2::new(5.0, -14.0);
        player.anim = AnimState::Jump;

        let report = sync.outbound(&player, true, 1000.0).unwrap();
        assert_eq!((report.x, report.y), (10.0, 20.0));
        assert_eq!((report.vx, report.vy), (5.0, -14.0));
        assert_eq!(report.anim, AnimState::Jump);
        assert!(report.carrying);
        assert!(sync.outbound(&player, true, 1050.0).is_none());
    }

    #[test]
    fn test_inbound_overwrites_wholesale() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        sync.apply(&ChangeEvent::PlayerUpserted(record("other", 1.0, 2.0)));
        sync.apply(&ChangeEvent::PlayerUpserted(record("other", 300.0, 40.0)));

        let remote = sync.remote(&PlayerId::new("other")).unwrap();
        assert_eq!(remote.pos, Vec2::new(300.0, 40.0));
        assert_eq!(sync.remote_count(), 1);
    }

    #[test]
    fn test_stale_redelivery_keeps_newer_position() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        let id = PlayerId::new("other");
        assert!(sync.apply(&ChangeEvent::PlayerUpserted(sent_at(record("other", 300.0, 40.0), 200.0))));

        let mut stale = sent_at(record("other", 1.0, 2.0), 100.0);
        stale.collected = 2;
        assert!(sync.apply(&ChangeEvent::PlayerUpserted(stale.clone())));
        let remote = sync.remote(&id).unwrap();
        assert_eq!(remote.pos, Vec2::new(300.0, 40.0));
        assert_eq!(remote.sent_at_ms, 200.0);
        assert_eq!(remote.collected, 2);

        // Same stale row again changes nothing
        assert!(!sync.apply(&ChangeEvent::PlayerUpserted(stale)));

        // Equal timestamps (count-only patch) still overwrite
        let mut same = sent_at(record("other", 300.0, 40.0), 200.0);
        same.collected = 3;
        sync.apply(&ChangeEvent::PlayerUpserted(same));
        assert_eq!(sync.remote(&id).unwrap().collected, 3);
    }

    #[test]
    fn test_own_row_ignored() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        assert!(!sync.apply(&ChangeEvent::PlayerUpserted(record("me", 1.0, 2.0))));
        assert_eq!(sync.remote_count(), 0);
    }

    #[test]
    fn test_offline_and_deleted_removed() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        sync.seed(&[record("a", 0.0, 0.0), record("b", 0.0, 0.0)]);
        assert_eq!(sync.peers().len(), 2);

        let mut gone = record("a", 0.0, 0.0);
        gone.online = false;
        assert!(sync.apply(&ChangeEvent::PlayerUpserted(gone)));
        assert!(sync.apply(&ChangeEvent::PlayerDeleted {
            room_id: "room-1".to_string(),
            user_id: PlayerId::new("b"),
        }));
        assert_eq!(sync.remote_count(), 0);
        assert!(sync.peers().is_empty());
    }

    #[test]
    fn test_peers_carry_counts() {
        let mut sync = SyncAdapter::new(PlayerId::new("me"));
        let mut other = record("other", 0.0, 0.0);
        other.collected = 3;
        sync.apply(&ChangeEvent::PlayerUpserted(other));
        assert_eq!(sync.peers(), vec![PeerProgress { online: true, collected: 3 }]);
    }

    proptest! {
        #[test]
        fn prop_accepted_reports_spaced(gaps in prop::collection::vec(0.0f64..250.0, 1..60)) {
            let mut throttle = PositionThrottle::new(100.0);
            let mut now = 0.0;
            let mut accepted: Vec<f64> = Vec::new();
            for gap in gaps {
                now += gap;
                if throttle.try_acquire(now) {
                    accepted.push(now);
                }
            }
            prop_assert!(!accepted.is_empty());
            for pair in accepted.windows(2) {
                prop_assert!(pair[1] - pair[0] >= 100.0);
            }
        }
    }
}
