//! Read-only view of the session for renderers
//!
//! Built once per frame; derived values (marker positions, effect progress,
//! health fractions) are computed here so the renderer never touches the
//! simulation.

use serde::Serialize;

use super::grid::Cell;
use super::state::{EffectKind, GamePhase, GameState};
use crate::config::{EnemyKind, TowerKind};

#[derive(Debug, Clone, Serialize)]
pub struct TowerView {
    pub kind: TowerKind,
    pub cell: Cell,
    pub key: u8,
    pub active: bool,
    pub boosted: bool,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    /// 0-1
    pub health: f64,
    pub slowed: bool,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub x: f32,
    pub y: f32,
    /// 0 at creation, 1 at expiry
    pub progress: f64,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarkerView {
    /// 1.0 is the activation line
    pub position: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub phase: GamePhase,
    pub score: u64,
    pub resources: u32,
    pub lives: i32,
    pub combo: u32,
    pub wave: u32,
    pub max_waves: u32,
    pub wave_in_progress: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub grid_width: u32,
    pub grid_height: u32,
    pub path_cells: Vec<Cell>,
    pub hovered_cell: Option<Cell>,
    pub selected_tower: Option<TowerKind>,
    pub towers: Vec<TowerView>,
    pub enemies: Vec<EnemyView>,
    pub effects: Vec<EffectView>,
    pub beat_markers: Vec<MarkerView>,
    pub stats: SessionStats,
}

impl RenderSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let now = state.elapsed_ms;
        let interval = state.rhythm.interval_ms();

        let towers = state
            .towers
            .iter()
            .map(|t| TowerView {
                kind: t.kind,
                cell: t.cell,
                key: t.key,
                active: t.active,
                boosted: t.boosted,
                color: state.config.towers.get(t.kind).color.clone(),
            })
            .collect();

        let enemies = state
            .enemies
            .iter()
            .map(|e| EnemyView {
                kind: e.kind,
                x: e.pos.x,
                y: e.pos.y,
                health: (e.health / e.max_health).clamp(0.0, 1.0),
                slowed: e.is_slowed(now),
                color: state.config.enemies.get(e.kind).color.clone(),
            })
            .collect();

        let effects = state
            .effects
            .iter()
            .map(|fx| EffectView {
                kind: fx.kind,
                x: fx.pos.x,
                y: fx.pos.y,
                progress: fx.progress(now),
                color: fx.color.clone(),
            })
            .collect();

        let beat_markers = state
            .rhythm
            .markers()
            .iter()
            .map(|m| MarkerView {
                position: m.position(now, interval),
                active: m.active,
            })
            .collect();

        Self {
            grid_width: state.grid.width(),
            grid_height: state.grid.height(),
            path_cells: state.grid.path_cells(),
            hovered_cell: state.hovered_cell,
            selected_tower: state.selected_tower,
            towers,
            enemies,
            effects,
            beat_markers,
            stats: SessionStats {
                phase: state.phase,
                score: state.score,
                resources: state.resources,
                lives: state.lives,
                combo: state.combo,
                wave: state.wave.number,
                max_waves: state.config.max_waves,
                wave_in_progress: state.wave.in_progress,
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::enemies::{damage_enemy, spawn_enemy};
    use crate::sim::towers::place_tower;

    #[test]
    fn test_capture_derives_values() {
        let mut state = GameState::new(GameConfig::default());
        place_tower(&mut state, TowerKind::Pulse, Cell::new(0, 0)).unwrap();
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        damage_enemy(&mut state, id, 15.0);
        state.rhythm.spawn_marker(0.0);
        state.elapsed_ms = 250.0;

        let snap = RenderSnapshot::capture(&state);
        assert_eq!(snap.path_cells.len(), 17);
        assert_eq!(snap.towers[0].key, 1);
        assert_eq!(snap.towers[0].color, "#8B5CF6");
        assert_eq!(snap.enemies[0].health, 0.5);
        assert_eq!(snap.beat_markers[0].position, 0.5);
        assert_eq!(snap.stats.resources, 70);
        assert_eq!(snap.stats.max_waves, 10);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(GameConfig::default());
        let json = RenderSnapshot::capture(&state).to_json().unwrap();
        assert!(json.contains("\"grid_width\":12"));
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
