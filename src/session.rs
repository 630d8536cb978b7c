//! Frame loop driver
//!
//! A `Session` owns everything one client needs to play: the game state, the
//! input controller, the sync adapter and (in a room) the store link. Browser
//! callbacks never touch the state directly; they post [`Message`]s that are
//! drained at the start of the next frame.
//!
//! Frame order: messages, input, local tick, store writes, remote merge,
//! snapshot. Local state is always applied before remote state.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::net::lobby::{self, Identity};
use crate::net::{
    ChangeEvent, ChangeFeed, ChatMessage, PlayerPatch, RemotePlayer, RoomPatch, RoomRecord,
    RoomStatus, RoomStore, StoreError, Subscription, SyncAdapter,
};
use crate::platform::{InputController, Key};
use crate::sim::rules::{adopt_round, force_finish, on_timer_second};
use crate::sim::{
    Fish, GameEvent, GamePhase, GameState, LevelCatalog, Player, Rect, Rules, tick,
};
use crate::stats::{GameSummary, ProfileStats};

/// Recent chat/event lines kept for the HUD
const MAX_NOTICES: usize = 8;

/// Something a browser callback wants the loop to handle
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// DOM `KeyboardEvent.key` of a keydown
    KeyDown(String),
    KeyUp(String),
    /// On-screen button tap
    Tap(Key),
    /// One round-clock second elapsed
    TimerSecond,
    /// Start the campaign over (single player)
    Restart,
    /// End the loop
    Stop,
}

/// Queue shared between the session and the harness callbacks
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    queue: Rc<RefCell<VecDeque<Message>>>,
}

impl Mailbox {
    pub fn post(&self, message: Message) {
        self.queue.borrow_mut().push_back(message);
    }

    fn take_all(&self) -> Vec<Message> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

/// Shared cancel flag for the frame loop
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
}

impl Default for LoopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopHandle {
    pub fn new() -> Self {
        Self {
            running: Rc::new(Cell::new(true)),
        }
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Numbers and labels for the heads-up display
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub level_name: String,
    pub round: u32,
    pub time_left: u32,
    pub collected: u32,
    pub score: u64,
    pub phase: GamePhase,
    pub fish_remaining: usize,
    pub carrying: bool,
    pub room_code: Option<String>,
    pub players_online: usize,
}

/// Read-only copy of everything the renderer and HUD need for one frame
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub player: Player,
    pub remotes: Vec<RemotePlayer>,
    pub platforms: Vec<Rect>,
    pub fish: Vec<Fish>,
    pub goal: Rect,
    pub hud: Hud,
    /// Everything that happened this frame, local and remote
    pub events: Vec<GameEvent>,
    /// Latest chat and event lines, oldest first
    pub notices: Vec<ChatMessage>,
}

/// Connection to a multiplayer room
struct RoomLink {
    store: Rc<dyn RoomStore>,
    subscription: Subscription,
    room_id: String,
    code: String,
    /// Last status seen on the room row
    status: RoomStatus,
    /// Last collected count the store accepted
    written_collected: u32,
}

/// One client's game
pub struct Session {
    identity: Identity,
    state: GameState,
    input: InputController,
    sync: SyncAdapter,
    mailbox: Mailbox,
    handle: LoopHandle,
    link: Option<RoomLink>,
    stats: ProfileStats,
    stats_recorded: bool,
    notices: VecDeque<ChatMessage>,
}

impl Session {
    fn with_state(identity: Identity, state: GameState, stats: ProfileStats) -> Self {
        Self {
            sync: SyncAdapter::new(identity.user_id.clone()),
            identity,
            state,
            input: InputController::new(),
            mailbox: Mailbox::default(),
            handle: LoopHandle::new(),
            link: None,
            stats,
            stats_recorded: false,
            notices: VecDeque::new(),
        }
    }

    /// Campaign game, started right away on the first level
    pub fn single_player(
        identity: Identity,
        rules: Rules,
        catalog: LevelCatalog,
        seed: u64,
    ) -> Self {
        let mut state = GameState::new(identity.user_id.clone(), rules, catalog, seed);
        state.start(0);
        Self::with_state(identity, state, ProfileStats::load())
    }

    /// Game in a room we already joined.
    ///
    /// Subscribes before reading the roster so no change is missed. A failed
    /// roster or stats read is logged and play continues with what arrives
    /// over the feed.
    pub fn multiplayer(
        identity: Identity,
        rules: Rules,
        catalog: LevelCatalog,
        seed: u64,
        store: Rc<dyn RoomStore>,
        feed: &dyn ChangeFeed,
        room: &RoomRecord,
    ) -> Self {
        let subscription = feed.subscribe(&room.id);
        let state = GameState::new(identity.user_id.clone(), rules, catalog, seed);

        let stats = store.load_stats(&identity.user_id).unwrap_or_else(|e| {
            log::warn!("Could not load stats: {}", e);
            ProfileStats::load()
        });
        let mut session = Self::with_state(identity, state, stats);

        let mut written_collected = 0;
        match store.players(&room.id) {
            Ok(players) => {
                written_collected = players
                    .iter()
                    .find(|player| player.user_id == session.identity.user_id)
                    .map_or(0, |player| player.collected);
                session.sync.seed(&players);
            }
            Err(e) => log::warn!("Could not read players of room {}: {}", room.code, e),
        }
        match store.messages(&room.id, None) {
            Ok(messages) => messages.into_iter().for_each(|m| session.push_notice(m)),
            Err(e) => log::warn!("Could not read messages of room {}: {}", room.code, e),
        }

        session.link = Some(RoomLink {
            store,
            subscription,
            room_id: room.id.clone(),
            code: room.code.clone(),
            status: room.status,
            written_collected,
        });
        if room.status == RoomStatus::Playing {
            session.begin_from_room(room);
        }
        session
    }

    /// Sender half for browser callbacks
    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub fn post(&self, message: Message) {
        self.mailbox.post(message);
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn stats(&self) -> &ProfileStats {
        &self.stats
    }

    pub fn room_id(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.room_id.as_str())
    }

    /// End the loop and mark this player offline in the room
    pub fn stop(&mut self) {
        self.handle.stop();
        self.leave_room();
    }

    /// Run one frame. Returns `None` once the loop was stopped.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameSnapshot> {
        if !self.handle.is_running() {
            // Stopped through a cloned handle
            self.leave_room();
            return None;
        }

        let mut local_events = Vec::new();
        for message in self.mailbox.take_all() {
            self.handle_message(message, now_ms, &mut local_events);
        }
        if !self.handle.is_running() {
            return None;
        }

        self.input.expire(now_ms);
        let input = self.input.sample();
        let peers = self.sync.peers();
        local_events.extend(tick(&mut self.state, &input, &peers));

        self.flush(&local_events, now_ms);
        let remote_events = self.merge_remote();
        self.finish_game_if_over();

        let mut events = local_events;
        events.extend(remote_events);
        Some(self.snapshot(events))
    }

    fn handle_message(&mut self, message: Message, now_ms: f64, events: &mut Vec<GameEvent>) {
        match message {
            Message::KeyDown(key) => {
                self.input.key_down(&key);
            }
            Message::KeyUp(key) => {
                self.input.key_up(&key);
            }
            Message::Tap(key) => self.input.tap(key, now_ms),
            Message::TimerSecond => on_timer_second(&mut self.state, events),
            Message::Restart => {
                if self.link.is_some() {
                    log::debug!("Restart ignored in a room; the host starts the next game");
                } else if self.state.phase.is_over() {
                    self.state.start(0);
                    self.input.clear();
                    self.stats_recorded = false;
                }
            }
            Message::Stop => {
                log::info!("Stopping frame loop");
                self.stop();
            }
        }
    }

    /// Push this frame's local changes to the room. Failures are logged and
    /// the frame carries on; counts are retried next frame.
    fn flush(&mut self, events: &[GameEvent], now_ms: f64) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let user_id = &self.identity.user_id;

        if let Some(position) = self
            .sync
            .outbound(&self.state.player, self.state.is_carrying(), now_ms)
        {
            warn_on_error(
                "position update",
                link.store
                    .update_player(&link.room_id, user_id, &PlayerPatch::position(position)),
            );
        }

        if self.state.collected != link.written_collected {
            let patch = PlayerPatch::collected(self.state.collected);
            if warn_on_error(
                "count update",
                link.store.update_player(&link.room_id, user_id, &patch),
            )
            .is_some()
            {
                link.written_collected = self.state.collected;
            }
        }

        for event in events {
            let (patch, notice) = match event {
                GameEvent::FishDelivered { .. } => (
                    None,
                    format!("{} delivered a fish!", self.identity.display_name),
                ),
                GameEvent::RoundAdvanced { round, level } => (
                    Some(RoomPatch {
                        status: Some(RoomStatus::Playing),
                        round: Some(*round),
                        level_index: Some(*level),
                    }),
                    format!("Round {} begins", round),
                ),
                GameEvent::Won { score } => (
                    Some(RoomPatch {
                        status: Some(RoomStatus::Completed),
                        ..Default::default()
                    }),
                    format!("All rounds complete! Final score {}", score),
                ),
                GameEvent::TimeUp { .. } => (
                    Some(RoomPatch {
                        status: Some(RoomStatus::Waiting),
                        ..Default::default()
                    }),
                    format!("Time's up on round {}", self.state.round),
                ),
                _ => continue,
            };

            if let Some(patch) = patch {
                if let Some(status) = patch.status {
                    link.status = status;
                }
                warn_on_error("room update", link.store.update_room(&link.room_id, &patch));
            }
            warn_on_error(
                "event message",
                lobby::post_event(&*link.store, &self.identity, &link.room_id, &notice),
            );
        }
    }

    /// Drop the room link; later calls are no-ops
    fn leave_room(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        if let Err(e) = lobby::leave_room(&*link.store, &self.identity, &link.room_id) {
            log::warn!("Could not leave room {}: {}", link.code, e);
        }
    }

    /// Apply everything the feed delivered since the last frame
    fn merge_remote(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let Some(link) = self.link.as_ref() else {
            return events;
        };

        for change in link.subscription.drain() {
            self.sync.apply(&change);
            match change {
                ChangeEvent::RoomUpdated(room) => {
                    events.extend(self.follow_room(&room));
                }
                ChangeEvent::MessageAppended(message) => self.push_notice(message),
                ChangeEvent::PlayerUpserted(_) | ChangeEvent::PlayerDeleted { .. } => {}
            }
        }
        events
    }

    /// React to the room row changing under us
    fn follow_room(&mut self, room: &RoomRecord) -> Option<GameEvent> {
        let link = self.link.as_mut()?;
        let previous = std::mem::replace(&mut link.status, room.status);

        match room.status {
            RoomStatus::Playing if previous != RoomStatus::Playing => {
                self.begin_from_room(room);
                Some(GameEvent::RoundAdvanced {
                    round: self.state.round,
                    level: self.state.level_index,
                })
            }
            RoomStatus::Playing => adopt_round(&mut self.state, room.round, room.level_index),
            RoomStatus::Completed => force_finish(&mut self.state, true),
            RoomStatus::Waiting if previous == RoomStatus::Playing => {
                force_finish(&mut self.state, false)
            }
            RoomStatus::Waiting => None,
        }
    }

    /// (Re)start local play to match a room that is playing
    fn begin_from_room(&mut self, room: &RoomRecord) {
        let carried_over = self.link.as_ref().map_or(0, |link| link.written_collected);
        self.state.start(room.level_index);
        if room.round > 1 {
            // Joined mid-game: keep our count, skip to the room's round
            self.state.collected = carried_over;
            self.state.enter_round(room.round, room.level_index);
        }
        self.input.clear();
        self.stats_recorded = false;
    }

    /// Record stats once per finished game
    fn finish_game_if_over(&mut self) {
        if !self.state.phase.is_over() || self.stats_recorded {
            return;
        }
        self.stats_recorded = true;

        let summary = GameSummary {
            score: self.state.score,
            fish: self.state.collected,
            round: self.state.round,
            won: self.state.phase == GamePhase::Won,
        };
        if self.stats.record(&summary) {
            log::info!("New best score: {}", summary.score);
        }
        self.stats.save();
        if let Some(link) = &self.link {
            warn_on_error(
                "stats save",
                link.store.save_stats(&self.identity.user_id, &self.stats),
            );
        }
    }

    fn push_notice(&mut self, message: ChatMessage) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(message);
    }

    fn snapshot(&self, events: Vec<GameEvent>) -> FrameSnapshot {
        let level = self.state.level();
        FrameSnapshot {
            player: self.state.player.clone(),
            remotes: self.sync.remotes().cloned().collect(),
            platforms: level.platforms.clone(),
            fish: self.state.fish.clone(),
            goal: level.goal,
            hud: Hud {
                level_name: level.name.clone(),
                round: self.state.round,
                time_left: self.state.time_left,
                collected: self.state.collected,
                score: self.state.score,
                phase: self.state.phase,
                fish_remaining: self.state.fish_remaining(),
                carrying: self.state.is_carrying(),
                room_code: self.link.as_ref().map(|link| link.code.clone()),
                players_online: self.sync.remote_count() + 1,
            },
            events,
            notices: self.notices.iter().cloned().collect(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Log a failed store call; the caller keeps going either way
fn warn_on_error<T>(what: &str, result: Result<T, StoreError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Store {} failed: {}", what, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::lobby::{create_room, join_room, start_game};
    use crate::net::MemoryBackend;
    use crate::sim::PlayerId;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const FRAME_MS: f64 = 16.0;

    fn solo() -> Session {
        Session::single_player(
            Identity::new("me", "Mittens"),
            Rules::single_player(),
            LevelCatalog::builtin(),
            1,
        )
    }

    /// Host and guest in a started room on one shared backend
    fn room_pair(start: bool) -> (MemoryBackend, Session, Session) {
        let backend = MemoryBackend::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let host_id = Identity::new("host", "Mittens");
        let guest_id = Identity::new("guest", "Tom");
        let room = create_room(&backend, &host_id, &mut rng).unwrap();
        join_room(&backend, &guest_id, &room.code).unwrap();
        let room = if start {
            start_game(&backend, &room.id, &LevelCatalog::builtin(), &mut rng).unwrap()
        } else {
            room
        };

        let store: Rc<dyn RoomStore> = Rc::new(backend.clone());
        let open = |identity: Identity, seed: u64| {
            Session::multiplayer(
                identity,
                Rules::multiplayer(),
                LevelCatalog::builtin(),
                seed,
                store.clone(),
                &backend,
                &room,
            )
        };
        let host = open(host_id, 10);
        let guest = open(guest_id, 20);
        (backend, host, guest)
    }

    #[test]
    fn test_spawn_fall_and_land() {
        let mut session = solo();
        assert_eq!(session.state().player.pos, Vec2::new(100.0, 300.0));

        let mut snapshot = None;
        for i in 0..60 {
            snapshot = session.frame(i as f64 * FRAME_MS);
        }
        let snapshot = snapshot.unwrap();
        // Resting on the platform at y = 470
        assert_eq!(snapshot.player.pos.y, 430.0);
        assert_eq!(snapshot.player.vel.y, 0.0);
        // The fish at (130, 450) sits where the cat lands
        assert_eq!(snapshot.hud.collected, 1);
        assert_eq!(snapshot.hud.phase, GamePhase::Playing);
    }

    #[test]
    fn test_keys_move_player() {
        let mut session = solo();
        for i in 0..40 {
            session.frame(i as f64 * FRAME_MS);
        }
        let start_x = session.state().player.pos.x;
        session.post(Message::KeyDown("ArrowRight".to_string()));
        for i in 40..50 {
            session.frame(i as f64 * FRAME_MS);
        }
        assert_eq!(session.state().player.pos.x, start_x + 50.0);

        session.post(Message::KeyUp("ArrowRight".to_string()));
        session.post(Message::KeyDown(" ".to_string()));
        let snapshot = session.frame(50.0 * FRAME_MS).unwrap();
        assert!(snapshot.events.contains(&GameEvent::Jumped));
    }

    #[test]
    fn test_tap_moves_then_releases() {
        let mut session = solo();
        for i in 0..40 {
            session.frame(i as f64 * FRAME_MS);
        }
        let start_x = session.state().player.pos.x;
        let t0 = 40.0 * FRAME_MS;

        session.post(Message::Tap(Key::Right));
        // Held for TAP_DURATION_MS: frames at t0 .. t0 + 96
        for i in 0..7 {
            session.frame(t0 + i as f64 * FRAME_MS);
        }
        assert_eq!(session.state().player.pos.x, start_x + 35.0);
        assert!(session.input.is_held(Key::Right));

        session.frame(t0 + 7.0 * FRAME_MS);
        assert!(!session.input.is_held(Key::Right));
        // Friction takes over from the tap speed
        assert!(session.state().player.vel.x < crate::consts::MOVE_SPEED);
    }

    #[test]
    fn test_stop_halts_frames() {
        let mut session = solo();
        let handle = session.handle();
        assert!(session.frame(0.0).is_some());
        session.post(Message::Stop);
        assert!(session.frame(16.0).is_none());
        assert!(!handle.is_running());
        assert!(session.frame(32.0).is_none());
    }

    #[test]
    fn test_drop_cancels_handle() {
        let session = solo();
        let handle = session.handle();
        drop(session);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_campaign_time_up_records_stats() {
        let mut session = solo();
        for _ in 0..90 {
            session.post(Message::TimerSecond);
        }
        let snapshot = session.frame(0.0).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::TimeUp);
        assert!(matches!(snapshot.events.last(), Some(GameEvent::TimeUp { .. })));
        assert_eq!(session.stats().games_played, 1);

        // Frames keep coming but nothing is recorded twice
        session.frame(16.0).unwrap();
        assert_eq!(session.stats().games_played, 1);

        session.post(Message::Restart);
        let snapshot = session.frame(32.0).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::Playing);
        assert_eq!(snapshot.hud.time_left, 90);
    }

    #[test]
    fn test_remote_position_mirrored_exactly() {
        let (_backend, mut host, mut guest) = room_pair(false);
        // Room not started yet: nothing simulates, the report is as placed
        host.state_mut().player.pos = Vec2::new(10.0, 20.0);
        host.frame(0.0).unwrap();

        let snapshot = guest.frame(0.0).unwrap();
        let remote = snapshot
            .remotes
            .iter()
            .find(|r| r.id == PlayerId::new("host"))
            .unwrap();
        assert_eq!(remote.pos, Vec2::new(10.0, 20.0));
        assert_eq!(remote.name, "Mittens");
    }

    #[test]
    fn test_moving_remote_matches_local_snapshot() {
        let (_backend, mut host, mut guest) = room_pair(true);
        let host_view = host.frame(0.0).unwrap();
        let guest_view = guest.frame(0.0).unwrap();
        assert_eq!(guest_view.remotes.len(), 1);
        assert_eq!(guest_view.remotes[0].pos, host_view.player.pos);
        assert_eq!(guest_view.remotes[0].vel, host_view.player.vel);
    }

    #[test]
    fn test_position_writes_throttled() {
        let (backend, mut host, _guest) = room_pair(true);
        let watcher = crate::net::ChangeFeed::subscribe(&backend, host.room_id().unwrap());

        for i in 0..63 {
            host.frame(i as f64 * FRAME_MS);
        }
        let sent: Vec<f64> = watcher
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                ChangeEvent::PlayerUpserted(record) if record.user_id == PlayerId::new("host") => {
                    Some(record.position.sent_at_ms)
                }
                _ => None,
            })
            .collect();

        // 1 second of frames: at most one report per 100 ms
        assert!(!sent.is_empty() && sent.len() <= 10);
        let mut last = None;
        for at in sent {
            if let Some(prev) = last {
                if at != prev {
                    assert!(at - prev >= 100.0);
                }
            }
            last = Some(at);
        }
    }

    #[test]
    fn test_timer_runs_out_in_room() {
        let (backend, mut host, mut guest) = room_pair(true);
        for _ in 0..60 {
            host.post(Message::TimerSecond);
        }
        let snapshot = host.frame(0.0).unwrap();
        assert_eq!(snapshot.hud.time_left, 0);
        assert_eq!(snapshot.hud.phase, GamePhase::TimeUp);
        let room_id = host.room_id().unwrap().to_string();
        assert_eq!(backend.room(&room_id).unwrap().status, RoomStatus::Waiting);

        // The guest's clock had not run out, but the room says it is over
        let snapshot = guest.frame(0.0).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::TimeUp);
        assert!(snapshot.notices.iter().any(|m| m.body == "Time's up on round 1"));
    }

    #[test]
    fn test_round_advances_when_everyone_delivered() {
        let (backend, mut host, mut guest) = room_pair(true);

        host.state_mut().collected = 1;
        host.frame(0.0).unwrap();
        guest.state_mut().collected = 1;
        guest.frame(0.0).unwrap();
        // Guest now knows the host's count; quota met on the next tick
        let snapshot = guest.frame(FRAME_MS).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::RoundComplete { advance_in: 3 });

        for _ in 0..3 {
            guest.post(Message::TimerSecond);
        }
        let snapshot = guest.frame(2.0 * FRAME_MS).unwrap();
        assert_eq!(snapshot.hud.round, 2);
        assert_eq!(snapshot.hud.phase, GamePhase::Playing);

        let room = backend.room(host.room_id().unwrap()).unwrap();
        assert_eq!(room.round, 2);

        // Host follows the room row without waiting on its own countdown
        host.frame(FRAME_MS).unwrap();
        host.frame(2.0 * FRAME_MS).unwrap();
        assert_eq!(host.state().round, 2);
        assert_eq!(host.state().level_index, guest.state().level_index);
        assert_eq!(host.state().time_left, 60);
    }

    #[test]
    fn test_stopped_guest_leaves_room() {
        let (backend, mut host, mut guest) = room_pair(true);
        let room_id = host.room_id().unwrap().to_string();
        host.frame(0.0).unwrap();
        guest.frame(0.0).unwrap();

        host.state_mut().collected = 1;
        let snapshot = host.frame(FRAME_MS).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::Playing);

        guest.post(Message::Stop);
        assert!(guest.frame(FRAME_MS).is_none());
        let players = backend.players(&room_id).unwrap();
        let row = players.iter().find(|p| p.user_id == PlayerId::new("guest")).unwrap();
        assert!(!row.online);
        drop(guest);

        // Host drops the guest from its roster, then meets the quota alone
        let snapshot = host.frame(2.0 * FRAME_MS).unwrap();
        assert!(snapshot.notices.iter().any(|m| m.body == "Tom left the room"));
        assert!(snapshot.remotes.is_empty());
        let snapshot = host.frame(3.0 * FRAME_MS).unwrap();
        assert_eq!(snapshot.hud.phase, GamePhase::RoundComplete { advance_in: 3 });
    }

    #[test]
    fn test_dropped_session_goes_offline() {
        let (backend, host, guest) = room_pair(true);
        let room_id = host.room_id().unwrap().to_string();
        drop(guest);
        let players = backend.players(&room_id).unwrap();
        let row = players.iter().find(|p| p.user_id == PlayerId::new("guest")).unwrap();
        assert!(!row.online);
        let row = players.iter().find(|p| p.user_id == PlayerId::new("host")).unwrap();
        assert!(row.online);
    }

    #[test]
    fn test_store_outage_not_fatal() {
        let (backend, mut host, _guest) = room_pair(true);
        backend.set_offline(true);
        host.state_mut().collected = 1;
        for i in 0..10 {
            assert!(host.frame(i as f64 * FRAME_MS).is_some());
        }
        assert!(host.state().time_ticks >= 10);

        // Count is written once the store is back
        backend.set_offline(false);
        host.frame(200.0).unwrap();
        let players = backend.players(host.room_id().unwrap()).unwrap();
        let me = players.iter().find(|p| p.user_id == PlayerId::new("host")).unwrap();
        assert_eq!(me.collected, 1);
    }

    #[test]
    fn test_delivery_posts_event_message() {
        let (backend, mut host, _guest) = room_pair(true);
        let goal = host.state().level().goal;
        host.state_mut().fish[0].state =
            crate::sim::FishState::Carried(PlayerId::new("host"));
        host.state_mut().player.pos = Vec2::new(goal.x, goal.y);
        let snapshot = host.frame(0.0).unwrap();
        assert!(snapshot
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::FishDelivered { total: 1, .. })));

        let events = backend
            .messages(host.room_id().unwrap(), Some(crate::net::MessageKind::Event))
            .unwrap();
        assert!(events.iter().any(|m| m.body == "Mittens delivered a fish!"));
    }
}
