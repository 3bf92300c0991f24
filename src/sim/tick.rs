//! Per-frame simulation tick
//!
//! Input queued since the last frame is applied first, at the current
//! simulation time, then the systems run in a fixed order: rhythm, tower
//! status, spawns, movement, wave completion.

use super::enemies::move_enemies;
use super::grid::Cell;
use super::state::{GameEvent, GamePhase, GameState};
use super::towers::{handle_activation_key, place_tower, remove_tower, update_towers};
use super::waves::{check_wave_complete, fire_due_spawns, start_wave};
use crate::cell_at_coords;
use crate::config::TowerKind;

/// A discrete player input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Activation key 1-4 pressed
    ActivateKey(u8),
    /// Pointer moved (canvas pixels)
    PointerMove { x: f32, y: f32 },
    /// Pointer clicked (canvas pixels)
    PointerClick { x: f32, y: f32 },
    /// Choose which tower a click places
    SelectTower(Option<TowerKind>),
    RemoveTower(Cell),
    StartWave,
    TogglePause,
    Restart,
}

/// Inputs gathered between two ticks
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub events: Vec<InputEvent>,
}

impl TickInput {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Apply one input to the session. Returns true if it changed anything.
pub fn apply_input(state: &mut GameState, event: InputEvent) -> bool {
    match event {
        InputEvent::ActivateKey(key) => handle_activation_key(state, key).is_some(),
        InputEvent::PointerMove { x, y } => {
            // Hover works while paused
            let cell = cell_at_coords(x, y, &state.config);
            let changed = state.hovered_cell != cell;
            state.hovered_cell = cell;
            changed
        }
        InputEvent::PointerClick { x, y } => {
            if state.phase != GamePhase::Playing {
                return false;
            }
            let (Some(kind), Some(cell)) = (state.selected_tower, cell_at_coords(x, y, &state.config))
            else {
                return false;
            };
            match place_tower(state, kind, cell) {
                Ok(_) => true,
                Err(err) => {
                    log::debug!("Placement rejected: {}", err);
                    false
                }
            }
        }
        InputEvent::SelectTower(kind) => {
            state.selected_tower = kind;
            true
        }
        InputEvent::RemoveTower(cell) => {
            state.phase == GamePhase::Playing && remove_tower(state, cell)
        }
        InputEvent::StartWave => state.phase == GamePhase::Playing && start_wave(state),
        InputEvent::TogglePause => {
            let before = state.phase;
            state.toggle_pause();
            before != state.phase
        }
        InputEvent::Restart => {
            state.reset();
            true
        }
    }
}

/// Advance the session by `dt_ms` of wall-clock time
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    for event in &input.events {
        apply_input(state, *event);
    }

    // Paused and finished sessions don't advance
    if state.phase != GamePhase::Playing {
        return;
    }

    state.elapsed_ms += dt_ms;

    if state.rhythm.advance(state.elapsed_ms) {
        state.push_event(GameEvent::Beat);
    }
    update_towers(state, dt_ms);
    fire_due_spawns(state);
    move_enemies(state, dt_ms);
    if !state.phase.is_over() {
        check_wave_complete(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    const FRAME: f64 = 1000.0 / 60.0;

    fn run(state: &mut GameState, ms: f64) {
        let input = TickInput::default();
        let mut t = 0.0;
        while t < ms {
            tick(state, &input, FRAME);
            t += FRAME;
        }
    }

    #[test]
    fn test_tick_advances_clock_and_beats() {
        let mut state = GameState::new(GameConfig::default());
        run(&mut state, 1000.0);
        assert!(state.elapsed_ms >= 1000.0);
        let beats = state
            .drain_events()
            .iter()
            .filter(|e| **e == GameEvent::Beat)
            .count();
        assert_eq!(beats, 2);
        assert_eq!(state.rhythm.markers().len(), 2);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut state = GameState::new(GameConfig::default());
        let mut input = TickInput::default();
        input.push(InputEvent::StartWave);
        tick(&mut state, &input, FRAME);
        run(&mut state, 600.0);

        let elapsed = state.elapsed_ms;
        let pos = state.enemies[0].pos;
        let pending = state.wave.pending_spawns();

        let mut pause = TickInput::default();
        pause.push(InputEvent::TogglePause);
        tick(&mut state, &pause, FRAME);
        assert_eq!(state.phase, GamePhase::Paused);
        run(&mut state, 5000.0);

        assert_eq!(state.elapsed_ms, elapsed);
        assert_eq!(state.enemies[0].pos, pos);
        assert_eq!(state.wave.pending_spawns(), pending);

        // Hover still tracks while paused
        let mut hover = TickInput::default();
        hover.push(InputEvent::PointerMove { x: 10.0, y: 10.0 });
        tick(&mut state, &hover, FRAME);
        assert_eq!(state.hovered_cell, Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_click_places_selected_tower() {
        let mut state = GameState::new(GameConfig::default());
        let mut input = TickInput::default();
        input.push(InputEvent::PointerClick { x: 10.0, y: 10.0 });
        tick(&mut state, &input, FRAME);
        assert!(state.towers.is_empty());

        let mut input = TickInput::default();
        input.push(InputEvent::SelectTower(Some(TowerKind::Beam)));
        input.push(InputEvent::PointerClick { x: 10.0, y: 10.0 });
        // On the path: rejected
        input.push(InputEvent::PointerClick { x: 10.0, y: 200.0 });
        tick(&mut state, &input, FRAME);
        assert_eq!(state.towers.len(), 1);
        assert_eq!(state.towers[0].cell, Cell::new(0, 0));
        assert_eq!(state.resources, 80);
    }

    #[test]
    fn test_wave_one_leaks_seven_lives() {
        let mut state = GameState::new(GameConfig::default());
        let mut input = TickInput::default();
        input.push(InputEvent::StartWave);
        tick(&mut state, &input, FRAME);

        // Last spawn at 12 s; path is 16 cells at 2 cells/s
        run(&mut state, 12_000.0);
        assert!(state.wave.in_progress);
        assert!(state.lives > 3);

        run(&mut state, 10_000.0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.enemies.is_empty());
        assert_eq!(state.wave.pending_spawns(), 0);
        // Cleared field with an empty queue completes the wave
        assert!(!state.wave.in_progress);
        assert_eq!(state.wave.number, 2);
        assert_eq!(state.resources, 110);
    }

    #[test]
    fn test_game_over_stops_ticks() {
        let config = GameConfig {
            initial_lives: 1,
            ..GameConfig::default()
        };
        let mut state = GameState::new(config);
        let mut input = TickInput::default();
        input.push(InputEvent::StartWave);
        tick(&mut state, &input, FRAME);
        run(&mut state, 10_000.0);

        assert_eq!(state.phase, GamePhase::GameOver);
        let elapsed = state.elapsed_ms;
        run(&mut state, 1000.0);
        assert_eq!(state.elapsed_ms, elapsed);

        let mut input = TickInput::default();
        input.push(InputEvent::Restart);
        tick(&mut state, &input, FRAME);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.lives, 1);
    }
}
