//! Kitty Courier entry point
//!
//! Browser: wires DOM events, the round clock and requestAnimationFrame to a
//! `Session`. Native: runs a short headless two-player game for smoke testing.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlInputElement, KeyboardEvent, PointerEvent};

    use kitty_courier::audio::{AudioManager, SoundEffect};
    use kitty_courier::consts::TIMER_INTERVAL_MS;
    use kitty_courier::net::lobby::{self, Identity};
    use kitty_courier::net::{MemoryBackend, RoomStore};
    use kitty_courier::platform::Key;
    use kitty_courier::renderer::{RenderState, snapshot_vertices};
    use kitty_courier::sim::{GamePhase, LevelCatalog, Rules};
    use kitty_courier::{FrameSnapshot, Mailbox, Message, Session, Settings};

    /// Game instance holding all state
    struct Game {
        session: Session,
        render_state: Option<RenderState>,
        audio: AudioManager,
        settings: Settings,
        /// Round clock interval, cleared when the loop stops
        timer_id: Option<i32>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        best_score: u64,
    }

    impl Game {
        fn track_fps(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&mut self, snapshot: &FrameSnapshot) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            match render_state.render(&snapshot_vertices(snapshot)) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory, rendering disabled");
                    self.render_state = None;
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        fn play_sounds(&mut self, snapshot: &FrameSnapshot) {
            for event in &snapshot.events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
            }
            let best = self.session.stats().best_score;
            if best > self.best_score {
                self.best_score = best;
                self.audio.play(SoundEffect::HighScore);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, snapshot: &FrameSnapshot) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = &snapshot.hud;
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let set_visible = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            set_text("#hud-score .hud-value", &hud.score.to_string());
            set_text("#hud-fish .hud-value", &hud.collected.to_string());
            set_text("#hud-time .hud-value", &hud.time_left.to_string());
            set_text("#hud-round .hud-value", &hud.round.to_string());
            set_text("#hud-level .hud-value", &hud.level_name);
            set_text("#hud-fps .hud-value", &self.fps.to_string());
            set_visible("hud-fps", self.settings.show_fps);
            set_text(
                "#hud-room .hud-value",
                hud.room_code.as_deref().unwrap_or("-"),
            );

            let chat: Vec<String> = snapshot
                .notices
                .iter()
                .map(|m| format!("{}: {}", m.display_name, m.body))
                .collect();
            set_text("#chat-log", &chat.join("\n"));

            set_visible("round-complete", matches!(hud.phase, GamePhase::RoundComplete { .. }));
            set_visible("game-over", hud.phase.is_over());
            if hud.phase.is_over() {
                let title = if hud.phase == GamePhase::Won {
                    "You win!"
                } else {
                    "Time's up!"
                };
                set_text("#game-over-title", title);
                set_text("#final-score", &hud.score.to_string());
                let win_rate = self.session.stats().win_rate() * 100.0;
                set_text("#win-rate", &format!("{:.0}%", win_rate));
            }
        }
    }

    fn query_param(name: &str) -> Option<String> {
        let search = web_sys::window()?.location().search().ok()?;
        web_sys::UrlSearchParams::new_with_str(&search)
            .ok()?
            .get(name)
    }

    /// Identity from the URL, or a throwaway guest id
    fn local_identity(settings: &Settings) -> Identity {
        let user_id = query_param("user")
            .unwrap_or_else(|| format!("guest-{}", (js_sys::Math::random() * 1e9) as u64));
        Identity::new(user_id, settings.display_name.clone())
    }

    /// `?room` plays room rules against an in-page store; otherwise the campaign
    fn new_session(identity: Identity, seed: u64) -> Result<Session, JsValue> {
        let catalog = LevelCatalog::builtin();
        if query_param("room").is_none() {
            return Ok(Session::single_player(
                identity,
                Rules::single_player(),
                catalog,
                seed,
            ));
        }

        let backend = MemoryBackend::new();
        let mut rng = <rand_pcg::Pcg32 as rand::SeedableRng>::seed_from_u64(seed);
        let to_js = |e: lobby::LobbyError| JsValue::from_str(&e.to_string());
        let room = lobby::create_room(&backend, &identity, &mut rng).map_err(to_js)?;
        let room = lobby::start_game(&backend, &room.id, &catalog, &mut rng).map_err(to_js)?;
        let store: Rc<dyn RoomStore> = Rc::new(backend.clone());
        Ok(Session::multiplayer(
            identity,
            Rules::multiplayer(),
            catalog,
            seed,
            store,
            &backend,
            &room,
        ))
    }

    async fn init_renderer(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> Option<RenderState> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::warn!("No drawing surface ({}), HUD only", e);
                return None;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::warn!("No graphics adapter ({}), HUD only", e);
                return None;
            }
        };
        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(render_state) => Some(render_state),
            Err(e) => {
                log::warn!("{}, HUD only", e);
                None
            }
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Kitty Courier starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let session = new_session(local_identity(&settings), seed)?;
        let mailbox = session.mailbox();
        log::info!("Game initialized with seed: {}", seed);

        let render_state = init_renderer(&canvas, width, height).await;

        let has_touch = window.navigator().max_touch_points() > 0;
        if let Some(el) = document.get_element_by_id("touch-controls") {
            let visible = settings.touch_controls.visible(has_touch);
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }

        let game = Rc::new(RefCell::new(Game {
            best_score: session.stats().best_score,
            session,
            render_state,
            audio: AudioManager::new(&settings),
            settings,
            timer_id: None,
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));

        setup_keyboard(&window, mailbox.clone(), game.clone());
        setup_touch_buttons(&document, mailbox.clone());
        setup_restart_button(&document, mailbox.clone());
        setup_settings_controls(&document, game.clone())?;
        let timer_id = setup_round_clock(&window, mailbox)?;
        game.borrow_mut().timer_id = Some(timer_id);
        setup_pagehide(&window, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game);
        log::info!("Kitty Courier running!");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, mailbox: Mailbox, game: Rc<RefCell<Game>>) {
        {
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if Key::from_dom(&key).is_some() {
                    event.prevent_default();
                    // Audio may only start after a user gesture
                    game.borrow().audio.resume();
                    mailbox.post(Message::KeyDown(key));
                } else if key == "Enter" {
                    mailbox.post(Message::Restart);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if Key::from_dom(&key).is_some() {
                    event.prevent_default();
                    mailbox.post(Message::KeyUp(key));
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_touch_buttons(document: &web_sys::Document, mailbox: Mailbox) {
        for id in ["btn-left", "btn-right", "btn-jump"] {
            let (Some(button), Some(key)) = (document.get_element_by_id(id), Key::from_button(id))
            else {
                continue;
            };
            let mailbox = mailbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                mailbox.post(Message::Tap(key));
            });
            let _ = button
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_restart_button(document: &web_sys::Document, mailbox: Mailbox) {
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                mailbox.post(Message::Restart);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Display name field and mute toggle; both persist to LocalStorage
    fn setup_settings_controls(
        document: &web_sys::Document,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        if let Some(el) = document.get_element_by_id("name-input") {
            let input: HtmlInputElement = el.dyn_into()?;
            input.set_value(&game.borrow().settings.display_name);
            let field = input.clone();
            let game = game.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                let mut g = game.borrow_mut();
                g.settings.set_display_name(&field.value());
                field.set_value(&g.settings.display_name);
                g.settings.save();
                log::info!("Display name set to {}, used from the next game", g.settings.display_name);
            });
            input.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let label = |muted: bool| if muted { "Unmute" } else { "Mute" };
            btn.set_text_content(Some(label(game.borrow().settings.muted)));
            let button = btn.clone();
            let closure = Closure::<dyn FnMut()>::new(move || {
                let mut g = game.borrow_mut();
                g.settings.muted = !g.settings.muted;
                g.settings.save();
                let Game {
                    audio, settings, ..
                } = &mut *g;
                audio.apply_settings(settings);
                button.set_text_content(Some(label(settings.muted)));
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Leaving the page ends the session so the room sees us go offline
    fn setup_pagehide(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut()>::new(move || {
            let mut g = game.borrow_mut();
            g.session.stop();
            if let (Some(window), Some(id)) = (web_sys::window(), g.timer_id.take()) {
                window.clear_interval_with_handle(id);
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// 1 Hz round clock
    fn setup_round_clock(window: &web_sys::Window, mailbox: Mailbox) -> Result<i32, JsValue> {
        let closure = Closure::<dyn FnMut()>::new(move || {
            mailbox.post(Message::TimerSecond);
        });
        let id = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TIMER_INTERVAL_MS as i32,
        )?;
        closure.forget();
        Ok(id)
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let Some(snapshot) = g.session.frame(time) else {
                // Stopped: drop the clock and do not reschedule
                if let (Some(window), Some(id)) = (web_sys::window(), g.timer_id.take()) {
                    window.clear_interval_with_handle(id);
                }
                log::info!("Frame loop ended");
                return;
            };

            g.track_fps(time);
            g.render(&snapshot);
            g.play_sounds(&snapshot);
            g.update_hud(&snapshot);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    if let Err(e) = wasm_game::run().await {
        log::error!("Start-up failed: {:?}", e);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Kitty Courier (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    match headless_room_demo() {
        Ok(()) => println!("Headless demo finished"),
        Err(e) => {
            eprintln!("Headless demo failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Two sessions in one in-process room: the guest runs right for a while, the
/// host stands still, and the clock ticks once per 60 frames.
#[cfg(not(target_arch = "wasm32"))]
fn headless_room_demo() -> Result<(), kitty_courier::net::LobbyError> {
    use std::rc::Rc;

    use kitty_courier::net::lobby::{self, Identity};
    use kitty_courier::net::{MemoryBackend, RoomStore};
    use kitty_courier::sim::{LevelCatalog, Rules};
    use kitty_courier::{Message, Session};
    use rand::SeedableRng;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    let backend = MemoryBackend::new();
    let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
    let host_id = Identity::new("host", "Mittens");
    let guest_id = Identity::new("guest", "Tom");

    let room = lobby::create_room(&backend, &host_id, &mut rng)?;
    lobby::join_room(&backend, &guest_id, &room.code)?;
    let room = lobby::start_game(&backend, &room.id, &LevelCatalog::builtin(), &mut rng)?;
    lobby::send_chat(&backend, &guest_id, &room.id, "here kitty kitty")?;
    println!("Room {} started on level {}", room.code, room.level_index);

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
    let mut host = open(host_id, 1);
    let mut guest = open(guest_id, 2);

    guest.post(Message::KeyDown("ArrowRight".to_string()));
    for frame in 0..600u32 {
        let now = frame as f64 * FRAME_MS;
        if frame > 0 && frame % 60 == 0 {
            host.post(Message::TimerSecond);
            guest.post(Message::TimerSecond);
        }
        if frame == 90 {
            guest.post(Message::KeyUp("ArrowRight".to_string()));
            guest.post(Message::KeyDown("ArrowUp".to_string()));
        }

        let (Some(host_view), Some(guest_view)) = (host.frame(now), guest.frame(now)) else {
            break;
        };
        if frame % 120 == 0 {
            let seen = host_view
                .remotes
                .first()
                .map(|r| (r.pos.x, r.pos.y))
                .unwrap_or_default();
            println!(
                "t={:>5.0}ms guest at ({:.1}, {:.1}), host sees ({:.1}, {:.1}), {}s left",
                now,
                guest_view.player.pos.x,
                guest_view.player.pos.y,
                seen.0,
                seen.1,
                guest_view.hud.time_left,
            );
        }
    }

    guest.stop();
    for message in lobby::chat_history(&backend, &room.id)? {
        println!("[chat] {}: {}", message.display_name, message.body);
    }
    let online = backend.players(&room.id)?.iter().filter(|p| p.online).count();
    println!("{} player(s) still online after the guest left", online);
    Ok(())
}
