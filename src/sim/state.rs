//! Game session state and entity types
//!
//! `GameState` is the single owned aggregate for a play session. Every system
//! takes it by `&mut`; nothing is global.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, Path};
use super::rhythm::{RhythmJudge, TimingQuality};
use super::waves::WaveState;
use crate::config::{EnemyKind, GameConfig, TowerKind};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Simulation running (between waves or mid-wave)
    Playing,
    /// Updates halted; hover still works
    Paused,
    /// Lives ran out
    GameOver,
    /// Final wave cleared
    Victory,
}

impl GamePhase {
    /// Terminal phases stop all updates
    pub fn is_over(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// A placed tower
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tower {
    pub id: u32,
    pub kind: TowerKind,
    pub cell: Cell,
    /// Activation key (1-4)
    pub key: u8,
    /// Showing as fired
    pub active: bool,
    pub activated_at: f64,
    /// Time left before the tower may fire again
    pub cooldown_ms: f64,
    pub boosted: bool,
    pub boost_started_at: f64,
    pub boost_duration_ms: f64,
}

impl Tower {
    pub fn new(id: u32, kind: TowerKind, cell: Cell, key: u8) -> Self {
        Self {
            id,
            kind,
            cell,
            key,
            active: false,
            activated_at: 0.0,
            cooldown_ms: 0.0,
            boosted: false,
            boost_started_at: 0.0,
            boost_duration_ms: 0.0,
        }
    }
}

/// An enemy walking the path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub health: f64,
    pub max_health: f64,
    /// Interpolated position in cell units
    pub pos: Vec2,
    /// Index of the vertex starting the current segment
    pub path_index: usize,
    /// Fraction of the current segment covered, [0, 1)
    pub progress: f32,
    pub slowed: bool,
    pub slow_started_at: f64,
    pub slow_duration_ms: f64,
}

impl Enemy {
    /// Grid row the enemy is nearest to
    #[inline]
    pub fn row(&self) -> i32 {
        self.pos.y.round() as i32
    }

    /// Slow status still running at `now`
    pub fn is_slowed(&self, now: f64) -> bool {
        self.slowed && now - self.slow_started_at < self.slow_duration_ms
    }
}

/// Visual marker kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectKind {
    Beam,
    Pulse { range: f32 },
    Shield { range: f32 },
    Boost { range: f32 },
    /// Floating "+score" text
    ScorePopup { value: u64 },
}

/// A time-boxed visual effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Origin in cell units
    pub pos: Vec2,
    pub started_at: f64,
    pub duration_ms: f64,
    pub color: String,
}

impl Effect {
    /// 0 at creation, 1 at expiry
    pub fn progress(&self, now: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.started_at >= self.duration_ms
    }
}

/// Something the front end may want to react to (audio, HUD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Beat,
    TowerPlaced { id: u32, kind: TowerKind },
    TowerActivated { id: u32, quality: TimingQuality },
    EnemySpawned { id: u32, kind: EnemyKind },
    EnemyHit { id: u32 },
    EnemyDefeated { id: u32, score: u64 },
    EnemyEscaped { id: u32 },
    WaveStarted { wave: u32 },
    WaveCompleted { wave: u32, bonus: u32 },
    GameOver { victory: bool, score: u64 },
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub config: GameConfig,
    pub phase: GamePhase,
    pub score: u64,
    pub resources: u32,
    pub lives: i32,
    /// Consecutive non-miss activations
    pub combo: u32,
    /// Simulation time (ms); frozen while paused
    pub elapsed_ms: f64,
    pub grid: Grid,
    pub path: Path,
    /// Towers in placement order
    pub towers: Vec<Tower>,
    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,
    pub effects: Vec<Effect>,
    pub rhythm: RhythmJudge,
    pub wave: WaveState,
    /// Tower type chosen in the build menu
    pub selected_tower: Option<TowerKind>,
    /// Cell under the pointer
    pub hovered_cell: Option<Cell>,
    /// Events since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Fresh session from configuration
    pub fn new(config: GameConfig) -> Self {
        let path = Path::new(config.path.clone());
        let grid = Grid::new(&config, &path);
        let rhythm = RhythmJudge::new(config.bpm, 0.0);
        let wave = WaveState::new(config.initial_wave);
        Self {
            phase: GamePhase::Playing,
            score: 0,
            resources: config.initial_resources,
            lives: config.initial_lives,
            combo: 0,
            elapsed_ms: 0.0,
            grid,
            path,
            towers: Vec::new(),
            enemies: Vec::new(),
            effects: Vec::new(),
            rhythm,
            wave,
            selected_tower: None,
            hovered_cell: None,
            events: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// Discard everything and start over with the same configuration
    pub fn reset(&mut self) {
        log::info!("Session reset");
        *self = GameState::new(self.config.clone());
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tower(&self, id: u32) -> Option<&Tower> {
        self.towers.iter().find(|t| t.id == id)
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Enter a terminal phase once, announcing it
    pub fn finish(&mut self, victory: bool) {
        if self.phase.is_over() {
            return;
        }
        self.phase = if victory {
            GamePhase::Victory
        } else {
            GamePhase::GameOver
        };
        log::info!(
            "{} at wave {} with score {}",
            if victory { "Victory" } else { "Game over" },
            self.wave.number,
            self.score
        );
        self.push_event(GameEvent::GameOver {
            victory,
            score: self.score,
        });
    }

    /// Toggle between Playing and Paused; no-op once the game is over
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            other => other,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_from_config() {
        let state = GameState::new(GameConfig::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.resources, 100);
        assert_eq!(state.lives, 10);
        assert_eq!(state.wave.number, 1);
        assert!(!state.wave.in_progress);
        assert!(state.towers.is_empty());
        assert_eq!(state.rhythm.interval_ms(), 500.0);
    }

    #[test]
    fn test_entity_ids_increase() {
        let mut state = GameState::new(GameConfig::default());
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_toggle_pause() {
        let mut state = GameState::new(GameConfig::default());
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Paused);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::Playing);

        state.finish(false);
        state.toggle_pause();
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_finish_announces_once() {
        let mut state = GameState::new(GameConfig::default());
        state.score = 42;
        state.finish(true);
        state.finish(false);
        assert_eq!(state.phase, GamePhase::Victory);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::GameOver {
                victory: true,
                score: 42
            }]
        );
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_reset_restores_config_values() {
        let mut state = GameState::new(GameConfig::default());
        state.score = 500;
        state.lives = 1;
        state.elapsed_ms = 12_000.0;
        state.reset();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 10);
        assert_eq!(state.elapsed_ms, 0.0);
    }

    #[test]
    fn test_effect_expiry() {
        let effect = Effect {
            kind: EffectKind::Beam,
            pos: Vec2::ZERO,
            started_at: 100.0,
            duration_ms: 500.0,
            color: String::new(),
        };
        assert!(!effect.is_expired(599.0));
        assert!(effect.is_expired(600.0));
        assert_eq!(effect.progress(350.0), 0.5);
    }
}
