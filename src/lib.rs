//! Rhythm Defense - A beat-synced tower defense game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rhythm judge, towers, enemies, waves)
//! - `config`: Data-driven game balance (grid, path, type tables)
//! - `highscores`: Per-game leaderboard persistence
//! - `settings`: Player preferences
//! - `audio`: Sound cues (playback via Web Audio, wasm only)

pub mod audio;
pub mod config;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use highscores::{HighScoreStore, HighScores};
pub use settings::Settings;

use sim::Cell;

/// Game timing constants (all times in milliseconds)
pub mod consts {
    /// Number of distinct activation keys (1-4)
    pub const ACTIVATION_KEYS: u8 = 4;

    /// Marker position where a hit is ideal
    pub const IDEAL_POSITION: f64 = 1.0;
    /// Judging window around the activation line, in beat positions
    pub const JUDGE_WINDOW_MIN: f64 = 0.7;
    pub const JUDGE_WINDOW_MAX: f64 = 1.3;
    /// Max distance from ideal for a perfect hit
    pub const PERFECT_WINDOW: f64 = 0.05;
    /// Max distance from ideal for a good hit
    pub const GOOD_WINDOW: f64 = 0.10;
    /// Markers past this position are pruned
    pub const MARKER_CUTOFF: f64 = 1.5;

    /// How long a tower shows as active after firing
    pub const TOWER_ACTIVE_MS: f64 = 500.0;
    /// Beam and pulse visual lifetime
    pub const BEAM_EFFECT_MS: f64 = 500.0;
    pub const PULSE_EFFECT_MS: f64 = 500.0;
    /// Base slow window, scaled by the timing multiplier
    pub const SHIELD_BASE_MS: f64 = 2000.0;
    /// Base boost window, scaled by the timing multiplier
    pub const BOOST_BASE_MS: f64 = 3000.0;
    /// Floating score text lifetime
    pub const SCORE_POPUP_MS: f64 = 1000.0;

    /// Speed multiplier while slowed
    pub const SLOW_FACTOR: f32 = 0.5;
    /// Converts cells/second speeds into per-millisecond progress
    pub const SPEED_TIME_SCALE: f32 = 1000.0;

    /// Gap between consecutive spawns in a wave
    pub const SPAWN_SPACING_MS: f64 = 2000.0;
    /// Resources awarded per wave number on completion
    pub const WAVE_BONUS_PER_WAVE: u32 = 10;

    /// Largest frame delta the clock will report (tab switches, breakpoints)
    pub const MAX_FRAME_DELTA_MS: f64 = 250.0;
}

/// Map canvas-relative pointer coordinates to a grid cell.
///
/// Returns `None` for pointers outside the canvas.
pub fn cell_at_coords(x: f32, y: f32, config: &GameConfig) -> Option<Cell> {
    let (cell_w, cell_h) = config.cell_size();
    if x < 0.0 || y < 0.0 || cell_w <= 0.0 || cell_h <= 0.0 {
        return None;
    }
    let gx = (x / cell_w).floor() as i32;
    let gy = (y / cell_h).floor() as i32;
    if gx < config.grid_width as i32 && gy < config.grid_height as i32 {
        Some(Cell::new(gx, gy))
    } else {
        None
    }
}

/// Parse a keyboard key into a tower activation key (1-4)
pub fn activation_key_from(key: &str) -> Option<u8> {
    let n: u8 = key.parse().ok()?;
    (1..=consts::ACTIVATION_KEYS).contains(&n).then_some(n)
}
