//! Seeded computer player for demos and soak tests
//!
//! Produces the same inputs a human would (key presses, clicks) so a run goes
//! through exactly the code paths real play does. Same seed, same run.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::Cell;
use super::state::{GamePhase, GameState};
use super::tick::InputEvent;
use crate::config::TowerKind;
use crate::consts::{ACTIVATION_KEYS, GOOD_WINDOW};

#[derive(Debug, Clone)]
pub struct AutoPlayer {
    rng: Pcg32,
    /// Presses land uniformly within +/- this many ms of the beat
    jitter_ms: f64,
    max_towers: usize,
    next_key: u8,
    /// Creation time of the last marker a press was planned for
    last_marker: Option<f64>,
    /// (marker created_at, press time)
    planned: Option<(f64, f64)>,
}

impl AutoPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            jitter_ms: 0.0,
            max_towers: ACTIVATION_KEYS as usize,
            next_key: 0,
            last_marker: None,
            planned: None,
        }
    }

    pub fn with_jitter(mut self, jitter_ms: f64) -> Self {
        self.jitter_ms = jitter_ms.abs();
        self
    }

    pub fn with_max_towers(mut self, max_towers: usize) -> Self {
        self.max_towers = max_towers;
        self
    }

    /// Forget beat bookkeeping (call after a restart)
    pub fn reset(&mut self) {
        self.next_key = 0;
        self.last_marker = None;
        self.planned = None;
    }

    /// Inputs for the next tick
    pub fn plan(&mut self, state: &GameState) -> Vec<InputEvent> {
        let mut inputs = Vec::new();
        if state.phase != GamePhase::Playing {
            return inputs;
        }

        if !state.wave.in_progress && state.enemies.is_empty() {
            inputs.push(InputEvent::StartWave);
        }

        if state.towers.len() < self.max_towers {
            if let Some((kind, cell)) = self.choose_build(state) {
                let (cell_w, cell_h) = state.config.cell_size();
                inputs.push(InputEvent::SelectTower(Some(kind)));
                inputs.push(InputEvent::PointerClick {
                    x: (cell.x as f32 + 0.5) * cell_w,
                    y: (cell.y as f32 + 0.5) * cell_h,
                });
            }
        }

        if !state.towers.is_empty() {
            if let Some(key) = self.choose_press(state) {
                inputs.push(InputEvent::ActivateKey(key));
            }
        }

        inputs
    }

    fn choose_build(&mut self, state: &GameState) -> Option<(TowerKind, Cell)> {
        let affordable: Vec<TowerKind> = TowerKind::ALL
            .into_iter()
            .filter(|kind| state.config.towers.get(*kind).cost <= state.resources)
            .collect();
        if affordable.is_empty() {
            return None;
        }
        let sites = build_sites(state);
        if sites.is_empty() {
            return None;
        }
        let kind = affordable[self.rng.random_range(0..affordable.len())];
        let cell = sites[self.rng.random_range(0..sites.len())];
        Some((kind, cell))
    }

    fn choose_press(&mut self, state: &GameState) -> Option<u8> {
        let interval = state.rhythm.interval_ms();
        let now = state.elapsed_ms;

        if self.planned.is_none() {
            let last = self.last_marker;
            let next = state
                .rhythm
                .markers()
                .iter()
                .filter(|m| m.active)
                .map(|m| m.created_at)
                .find(|&created_at| last.is_none_or(|last| created_at > last));
            if let Some(created_at) = next {
                let offset = if self.jitter_ms > 0.0 {
                    self.rng.random_range(-self.jitter_ms..=self.jitter_ms)
                } else {
                    0.0
                };
                self.planned = Some((created_at, created_at + interval + offset));
            }
        }

        let (created_at, press_at) = self.planned?;
        if now < press_at {
            return None;
        }
        self.planned = None;
        self.last_marker = Some(created_at);

        // Slept through it
        if now - press_at > interval * GOOD_WINDOW {
            return None;
        }

        let key_count = state.towers.len().min(ACTIVATION_KEYS as usize) as u8;
        let key = self.next_key % key_count + 1;
        self.next_key = self.next_key.wrapping_add(1);
        Some(key)
    }
}

/// Buildable cells touching the path, row-major
fn build_sites(state: &GameState) -> Vec<Cell> {
    let path_cells = state.grid.path_cells();
    let mut sites: Vec<Cell> = path_cells
        .iter()
        .flat_map(|cell| cell.neighbors())
        .filter(|cell| state.grid.is_buildable(*cell))
        .collect();
    sites.sort_by_key(|cell| (cell.y, cell.x));
    sites.dedup();
    sites
}
