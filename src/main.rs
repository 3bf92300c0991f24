//! Rhythm Defense entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use rhythm_defense::audio::{AudioManager, SoundEffect};
    use rhythm_defense::config::{GameConfig, TowerKind};
    use rhythm_defense::highscores::{self, LocalStorageStore};
    use rhythm_defense::settings::Settings;
    use rhythm_defense::sim::{
        AutoPlayer, FrameClock, GameEvent, GamePhase, GameState, InputEvent, RenderSnapshot,
        TickInput, tick,
    };
    use rhythm_defense::{activation_key_from, cell_at_coords};

    // The page owns drawing; we hand it one snapshot per frame
    #[wasm_bindgen(inline_js = "
        export function render_snapshot(json) {
            if (typeof window.renderRhythmDefense === 'function') {
                window.renderRhythmDefense(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn render_snapshot(json: &str);
    }

    /// A finished game waiting on the player's initials
    struct PendingHighScore {
        game_id: String,
        score: u64,
    }

    /// Ask for initials and store the entry. Blocks on a modal dialog.
    fn prompt_high_score(pending: PendingHighScore) {
        let Some(window) = web_sys::window() else { return };
        let initials = match window.prompt_with_message("New high score! Enter your initials:") {
            Ok(Some(initials)) if !initials.trim().is_empty() => initials,
            _ => return,
        };
        let date: String = js_sys::Date::new_0().to_iso_string().into();
        let mut store = LocalStorageStore;
        match highscores::record_score(&mut store, &pending.game_id, &initials, pending.score, &date) {
            Ok(Some(rank)) => log::info!("High score recorded at rank {}", rank),
            Ok(None) => {}
            Err(err) => log::warn!("Could not record high score: {}", err),
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        clock: FrameClock,
        input: TickInput,
        settings: Settings,
        audio: AudioManager,
        /// Computer player, when demo mode is on
        demo: Option<AutoPlayer>,
        canvas: HtmlCanvasElement,
    }

    impl Game {
        fn new(config: GameConfig, settings: Settings, canvas: HtmlCanvasElement) -> Self {
            let audio = AudioManager::from_settings(&settings);
            Self {
                state: GameState::new(config),
                clock: FrameClock::new(),
                input: TickInput::default(),
                settings,
                audio,
                demo: None,
                canvas,
            }
        }

        /// Convert client pixels to simulation canvas pixels
        fn to_canvas_coords(&self, event: &MouseEvent) -> (f32, f32) {
            let client_w = self.canvas.client_width().max(1) as f32;
            let client_h = self.canvas.client_height().max(1) as f32;
            let config = &self.state.config;
            (
                event.offset_x() as f32 * config.canvas_width / client_w,
                event.offset_y() as f32 * config.canvas_height / client_h,
            )
        }

        fn toggle_demo(&mut self) {
            self.demo = match self.demo {
                Some(_) => None,
                None => Some(AutoPlayer::new(js_sys::Date::now() as u64).with_jitter(40.0)),
            };
            log::info!("Demo mode: {}", self.demo.is_some());
        }

        /// Run one simulation tick for this frame.
        ///
        /// Returns a score waiting for initials; the caller must release its
        /// borrow before asking, since the dialog blurs the window.
        fn update(&mut self, time: f64) -> Option<PendingHighScore> {
            let dt = self.clock.advance(time);

            if let Some(player) = self.demo.as_mut() {
                let planned = player.plan(&self.state);
                self.input.events.extend(planned);
            }
            if self.input.events.contains(&InputEvent::Restart) {
                self.clock.reset();
                if let Some(player) = self.demo.as_mut() {
                    player.reset();
                }
            }

            tick(&mut self.state, &self.input, dt);
            self.input.clear();

            let mut pending = None;
            for event in self.state.drain_events() {
                if let Some(effect) = SoundEffect::from_event(&event) {
                    self.audio.play(effect);
                }
                if let GameEvent::GameOver { score, .. } = event {
                    pending = self.high_score_entry(score);
                }
            }
            pending
        }

        /// A finished game's leaderboard entry, if the player earned one
        fn high_score_entry(&self, score: u64) -> Option<PendingHighScore> {
            if self.demo.is_some() {
                return None;
            }
            let game_id = self.state.config.game_id.clone();
            let rank = highscores::entry_rank(&LocalStorageStore, &game_id, score)?;
            self.audio.play(SoundEffect::HighScore);
            log::info!("Score {} earns rank {}", score, rank);
            Some(PendingHighScore { game_id, score })
        }

        fn render(&self) {
            match RenderSnapshot::capture(&self.state).to_json() {
                Ok(json) => render_snapshot(&json),
                Err(err) => log::warn!("Snapshot encode failed: {}", err),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let state = &self.state;
            let set = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };

            set("#hud-score .hud-value", &state.score.to_string());
            set("#hud-resources .hud-value", &state.resources.to_string());
            set("#hud-lives .hud-value", &state.lives.to_string());
            set(
                "#hud-wave .hud-value",
                &format!("{}/{}", state.wave.number, state.config.max_waves),
            );

            // Combo only shows once it's going
            if let Some(el) = document.get_element_by_id("hud-combo") {
                if state.combo > 1 {
                    let _ = el.set_attribute("class", "hud-item");
                    set("#hud-combo .hud-value", &state.combo.to_string());
                    set(
                        "#hud-combo .multiplier",
                        &format!("x{:.1}", 1.0 + state.combo as f32 * 0.1),
                    );
                } else {
                    let _ = el.set_attribute("class", "hud-item hidden");
                }
            }

            for kind in TowerKind::ALL {
                if let Some(el) = document.get_element_by_id(&format!("tower-{}", kind.as_str())) {
                    let affordable = state.config.towers.get(kind).cost <= state.resources;
                    let mut class = String::from("tower-button");
                    if state.selected_tower == Some(kind) {
                        class.push_str(" selected");
                    }
                    if !affordable {
                        class.push_str(" disabled");
                    }
                    let _ = el.set_attribute("class", &class);
                }
            }

            let show = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };
            show("start-wave-btn", state.phase == GamePhase::Playing && !state.wave.in_progress);
            show("pause-menu", state.phase == GamePhase::Paused);
            show("game-over", state.phase.is_over());

            if state.phase.is_over() {
                set(
                    "#game-over .title",
                    if state.phase == GamePhase::Victory { "Victory!" } else { "Game Over" },
                );
                set("#final-score", &state.score.to_string());
                set("#final-wave", &state.wave.number.to_string());
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", err).into());
        }

        log::info!("Rhythm Defense starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        let config = GameConfig::default();
        canvas.set_width(config.canvas_width as u32);
        canvas.set_height(config.canvas_height as u32);

        let settings = Settings::load();
        let start_in_demo = settings.start_in_demo;
        let game = Rc::new(RefCell::new(Game::new(config, settings, canvas.clone())));
        if start_in_demo {
            game.borrow_mut().toggle_demo();
        }

        setup_input_handlers(&canvas, game.clone())?;
        setup_buttons(&document, game.clone());
        setup_auto_pause(game.clone())?;

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Rhythm Defense running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        // Mouse move - hover highlight
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let Ok(mut g) = game.try_borrow_mut() else { return };
                let (x, y) = g.to_canvas_coords(&event);
                g.input.push(InputEvent::PointerMove { x, y });
            });
            canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Click - place the selected tower
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let Ok(mut g) = game.try_borrow_mut() else { return };
                g.audio.resume();
                let (x, y) = g.to_canvas_coords(&event);
                g.input.push(InputEvent::PointerClick { x, y });
            });
            canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Right click - remove a tower
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                let Ok(mut g) = game.try_borrow_mut() else { return };
                let (x, y) = g.to_canvas_coords(&event);
                if let Some(cell) = cell_at_coords(x, y, &g.state.config) {
                    g.input.push(InputEvent::RemoveTower(cell));
                }
            });
            canvas.add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or("no window")?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let Ok(mut g) = game.try_borrow_mut() else { return };
                let key = event.key();
                if let Some(n) = activation_key_from(&key) {
                    g.input.push(InputEvent::ActivateKey(n));
                    return;
                }
                match key.as_str() {
                    " " => {
                        event.prevent_default();
                        g.input.push(InputEvent::StartWave);
                    }
                    "p" | "P" | "Escape" => g.input.push(InputEvent::TogglePause),
                    "r" | "R" => g.input.push(InputEvent::Restart),
                    "m" | "M" => {
                        g.settings.toggle_mute();
                        let settings = g.settings.clone();
                        g.audio.apply_settings(&settings);
                        settings.save();
                    }
                    "d" | "D" => g.toggle_demo(),
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        // Tower picker: clicking the selected tower again deselects it
        for kind in TowerKind::ALL {
            let Some(btn) = document.get_element_by_id(&format!("tower-{}", kind.as_str())) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let Ok(mut g) = game.try_borrow_mut() else { return };
                let selection = (g.state.selected_tower != Some(kind)).then_some(kind);
                g.input.push(InputEvent::SelectTower(selection));
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let buttons = [
            ("start-wave-btn", InputEvent::StartWave),
            ("pause-btn", InputEvent::TogglePause),
            ("resume-btn", InputEvent::TogglePause),
            ("restart-btn", InputEvent::Restart),
        ];
        for (id, input) in buttons {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let Ok(mut g) = game.try_borrow_mut() else { return };
                g.audio.resume();
                g.input.push(input);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let pending = {
            let mut g = game.borrow_mut();
            let pending = g.update(time);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
            pending
        };

        if let Some(pending) = pending {
            prompt_high_score(pending);
        }

        request_animation_frame(game);
    }

    /// Queue a pause unless one is already pending
    fn auto_pause(game: &Rc<RefCell<Game>>, reason: &str) {
        let Ok(mut g) = game.try_borrow_mut() else { return };
        if !g.settings.pause_on_blur || g.state.phase != GamePhase::Playing {
            return;
        }
        if !g.input.events.contains(&InputEvent::TogglePause) {
            g.input.push(InputEvent::TogglePause);
            log::info!("Auto-paused ({})", reason);
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    auto_pause(&game, "tab hidden");
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                auto_pause(&game, "window blur");
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Rhythm Defense (native) starting...");
    log::info!("Native mode runs a headless demo - run with `trunk serve` to play");

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse()?,
        None => 1,
    };
    let config = match args.next() {
        Some(path) => rhythm_defense::GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => rhythm_defense::GameConfig::default(),
    };

    headless::run_demo(config, seed)?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rhythm_defense::GameConfig;
    use rhythm_defense::highscores::{self, HighScoreError, HighScores, MemoryStore};
    use rhythm_defense::sim::{AutoPlayer, GameEvent, GamePhase, GameState, TickInput, tick};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Stop runaway demos after an hour of game time
    const MAX_GAME_MS: f64 = 60.0 * 60.0 * 1000.0;

    /// Let the computer play one full game and report the result
    pub fn run_demo(config: GameConfig, seed: u64) -> Result<(), HighScoreError> {
        let game_id = config.game_id.clone();
        let mut state = GameState::new(config);
        let mut player = AutoPlayer::new(seed).with_jitter(40.0);
        let mut input = TickInput::default();

        while !state.phase.is_over() && state.elapsed_ms < MAX_GAME_MS {
            input.events = player.plan(&state);
            tick(&mut state, &input, FRAME_MS);

            for event in state.drain_events() {
                match event {
                    GameEvent::WaveStarted { wave } => log::info!("Wave {} started", wave),
                    GameEvent::WaveCompleted { wave, bonus } => {
                        log::info!(
                            "Wave {} cleared (+{} resources, {} lives left)",
                            wave,
                            bonus,
                            state.lives
                        );
                    }
                    _ => {}
                }
            }
        }

        let outcome = match state.phase {
            GamePhase::Victory => "victory",
            GamePhase::GameOver => "defeat",
            _ => "timeout",
        };
        println!(
            "Seed {}: {} after {:.1}s - score {}, wave {}, {} towers",
            seed,
            outcome,
            state.elapsed_ms / 1000.0,
            state.score,
            state.wave.number,
            state.towers.len()
        );

        let mut store = MemoryStore::new();
        if highscores::is_high_score(&store, &game_id, state.score) {
            highscores::record_score(&mut store, &game_id, "CPU", state.score, "")?;
        }
        let board = HighScores::load(&store, &game_id);
        if let Some(top) = board.top_score() {
            println!("Top score: {}", top);
        }
        Ok(())
    }
}
