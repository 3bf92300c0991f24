//! Data-driven game configuration
//!
//! Grid, path, tempo, economy and the tower/enemy type tables. Balance changes
//! are data changes: load a JSON document with `GameConfig::from_json`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Cell;

/// Largest accepted grid side, in cells
pub const MAX_GRID_SIDE: u32 = 256;

/// Tower variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Damages everything ahead of it on its row
    Beam,
    /// Damages everything within range
    Pulse,
    /// Slows everything within range
    Shield,
    /// Boosts the eight neighbouring towers
    Boost,
}

impl TowerKind {
    pub const ALL: [TowerKind; 4] = [
        TowerKind::Beam,
        TowerKind::Pulse,
        TowerKind::Shield,
        TowerKind::Boost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TowerKind::Beam => "beam",
            TowerKind::Pulse => "pulse",
            TowerKind::Shield => "shield",
            TowerKind::Boost => "boost",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beam" => Some(TowerKind::Beam),
            "pulse" => Some(TowerKind::Pulse),
            "shield" => Some(TowerKind::Shield),
            "boost" => Some(TowerKind::Boost),
            _ => None,
        }
    }
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Runner,
    Tank,
    Flyer,
}

impl EnemyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Runner => "runner",
            EnemyKind::Tank => "tank",
            EnemyKind::Flyer => "flyer",
        }
    }
}

/// Per-variant tower constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    pub cost: u32,
    pub damage: f64,
    /// Euclidean range in cells
    pub range: f32,
    pub color: String,
}

/// Per-variant enemy constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub health: f64,
    /// Cells per second
    pub speed: f32,
    pub color: String,
}

/// Tower type table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerTable {
    pub beam: TowerStats,
    pub pulse: TowerStats,
    pub shield: TowerStats,
    pub boost: TowerStats,
}

impl TowerTable {
    pub fn get(&self, kind: TowerKind) -> &TowerStats {
        match kind {
            TowerKind::Beam => &self.beam,
            TowerKind::Pulse => &self.pulse,
            TowerKind::Shield => &self.shield,
            TowerKind::Boost => &self.boost,
        }
    }
}

impl Default for TowerTable {
    fn default() -> Self {
        Self {
            beam: TowerStats {
                cost: 20,
                damage: 10.0,
                range: 4.0,
                color: "#3B82F6".to_string(),
            },
            pulse: TowerStats {
                cost: 30,
                damage: 8.0,
                range: 2.0,
                color: "#8B5CF6".to_string(),
            },
            shield: TowerStats {
                cost: 25,
                damage: 0.0,
                range: 1.0,
                color: "#10B981".to_string(),
            },
            boost: TowerStats {
                cost: 15,
                damage: 0.0,
                range: 1.0,
                color: "#F59E0B".to_string(),
            },
        }
    }
}

/// Enemy type table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTable {
    pub runner: EnemyStats,
    pub tank: EnemyStats,
    pub flyer: EnemyStats,
}

impl EnemyTable {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Runner => &self.runner,
            EnemyKind::Tank => &self.tank,
            EnemyKind::Flyer => &self.flyer,
        }
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            runner: EnemyStats {
                health: 30.0,
                speed: 2.0,
                color: "#EF4444".to_string(),
            },
            tank: EnemyStats {
                health: 80.0,
                speed: 0.8,
                color: "#92400E".to_string(),
            },
            flyer: EnemyStats {
                health: 40.0,
                speed: 1.5,
                color: "#06B6D4".to_string(),
            },
        }
    }
}

/// Reasons a configuration document is rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("grid must be at most {max}x{max}, got {width}x{height}")]
    GridTooLarge { width: u32, height: u32, max: u32 },
    #[error("canvas must have a non-zero size")]
    EmptyCanvas,
    #[error("bpm must be positive, got {0}")]
    InvalidBpm(f64),
    #[error("path needs at least two vertices, got {0}")]
    PathTooShort(usize),
    #[error("path vertex {index} ({x}, {y}) lies outside the grid")]
    PathOutOfBounds { index: usize, x: i32, y: i32 },
    #[error("initial lives must be positive, got {0}")]
    InvalidLives(i32),
    #[error("initial wave {initial} must be between 1 and max waves {max}")]
    InvalidWaves { initial: u32, max: u32 },
    #[error("{kind} must have positive health and speed")]
    InvalidEnemy { kind: &'static str },
}

/// Complete game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Stable identifier used to key high scores
    pub game_id: String,
    pub grid_width: u32,
    pub grid_height: u32,
    /// Canvas size in pixels (pointer to cell mapping)
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Enemy path vertices, in traversal order
    pub path: Vec<Cell>,
    pub bpm: f64,
    pub initial_resources: u32,
    pub initial_lives: i32,
    pub initial_wave: u32,
    pub max_waves: u32,
    /// Minimum time between activations of one tower (0 = none)
    pub activation_cooldown_ms: f64,
    pub towers: TowerTable,
    pub enemies: EnemyTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_id: "rhythm-defense".to_string(),
            grid_width: 12,
            grid_height: 8,
            canvas_width: 800.0,
            canvas_height: 500.0,
            path: vec![
                Cell::new(0, 3),
                Cell::new(3, 3),
                Cell::new(3, 5),
                Cell::new(7, 5),
                Cell::new(7, 2),
                Cell::new(11, 2),
            ],
            bpm: 120.0,
            initial_resources: 100,
            initial_lives: 10,
            initial_wave: 1,
            max_waves: 10,
            activation_cooldown_ms: 0.0,
            towers: TowerTable::default(),
            enemies: EnemyTable::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON configuration; missing fields use defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        log::info!(
            "Loaded config '{}' ({}x{}, {} bpm, {} waves)",
            config.game_id,
            config.grid_width,
            config.grid_height,
            config.bpm,
            config.max_waves
        );
        Ok(config)
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.grid_width > MAX_GRID_SIDE || self.grid_height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                width: self.grid_width,
                height: self.grid_height,
                max: MAX_GRID_SIDE,
            });
        }
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(ConfigError::EmptyCanvas);
        }
        if self.bpm <= 0.0 || !self.bpm.is_finite() {
            return Err(ConfigError::InvalidBpm(self.bpm));
        }
        if self.path.len() < 2 {
            return Err(ConfigError::PathTooShort(self.path.len()));
        }
        for (index, v) in self.path.iter().enumerate() {
            if !self.in_bounds(*v) {
                return Err(ConfigError::PathOutOfBounds {
                    index,
                    x: v.x,
                    y: v.y,
                });
            }
        }
        if self.initial_lives <= 0 {
            return Err(ConfigError::InvalidLives(self.initial_lives));
        }
        if self.initial_wave == 0 || self.initial_wave > self.max_waves {
            return Err(ConfigError::InvalidWaves {
                initial: self.initial_wave,
                max: self.max_waves,
            });
        }
        for kind in [EnemyKind::Runner, EnemyKind::Tank, EnemyKind::Flyer] {
            let stats = self.enemies.get(kind);
            if stats.health <= 0.0 || stats.speed <= 0.0 {
                return Err(ConfigError::InvalidEnemy {
                    kind: kind.as_str(),
                });
            }
        }
        Ok(())
    }

    /// Milliseconds between beats
    pub fn beat_interval_ms(&self) -> f64 {
        60_000.0 / self.bpm
    }

    /// Pixel size of one cell (width, height)
    pub fn cell_size(&self) -> (f32, f32) {
        (
            self.canvas_width / self.grid_width as f32,
            self.canvas_height / self.grid_height as f32,
        )
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as u32) < self.grid_width
            && (cell.y as u32) < self.grid_height
    }
}
