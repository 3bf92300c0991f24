//! Tower placement, activation and per-type effects
//!
//! Towers fire only on key presses. The rhythm judge grades the press and the
//! grade scales whatever the tower does.

use thiserror::Error;

use super::enemies::damage_enemy;
use super::grid::Cell;
use super::rhythm::TimingQuality;
use super::state::{Effect, EffectKind, GameEvent, GamePhase, GameState, Tower};
use crate::config::TowerKind;
use crate::consts::*;

/// Reasons a placement request is rejected. Rejection never mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("cell ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Cell),
    #[error("cell ({}, {}) is on the enemy path", .0.x, .0.y)]
    OnPath(Cell),
    #[error("cell ({}, {}) already holds a tower", .0.x, .0.y)]
    Occupied(Cell),
    #[error("tower costs {cost}, only {available} available")]
    InsufficientResources { cost: u32, available: u32 },
    #[error("the session is over")]
    SessionOver,
}

/// Place a tower, paying its cost. Returns the new tower's id.
///
/// The activation key cycles 1..=4 by tower count at creation.
pub fn place_tower(state: &mut GameState, kind: TowerKind, cell: Cell) -> Result<u32, PlacementError> {
    if state.phase.is_over() {
        return Err(PlacementError::SessionOver);
    }
    if !state.grid.in_bounds(cell) {
        return Err(PlacementError::OutOfBounds(cell));
    }
    if state.grid.is_path(cell) {
        return Err(PlacementError::OnPath(cell));
    }
    if state.grid.is_occupied(cell) {
        return Err(PlacementError::Occupied(cell));
    }
    let cost = state.config.towers.get(kind).cost;
    if state.resources < cost {
        return Err(PlacementError::InsufficientResources {
            cost,
            available: state.resources,
        });
    }

    let id = state.next_entity_id();
    let key = (state.towers.len() % ACTIVATION_KEYS as usize) as u8 + 1;
    if !state.grid.set_tower(cell, id) {
        return Err(PlacementError::Occupied(cell));
    }
    state.resources -= cost;
    state.towers.push(Tower::new(id, kind, cell, key));

    log::debug!(
        "Placed {} tower #{} at ({}, {}) on key {}",
        kind.as_str(),
        id,
        cell.x,
        cell.y,
        key
    );
    state.push_event(GameEvent::TowerPlaced { id, kind });
    Ok(id)
}

/// Remove the tower on `cell`. No refund.
pub fn remove_tower(state: &mut GameState, cell: Cell) -> bool {
    let Some(id) = state.grid.clear_tower(cell) else {
        return false;
    };
    state.towers.retain(|t| t.id != id);
    log::debug!("Removed tower #{} at ({}, {})", id, cell.x, cell.y);
    true
}

/// Judge a key press and fire the tower holding `key`.
///
/// Returns the judged quality, or `None` when nothing fired (no tower on that
/// key, tower cooling down, or the session is paused or over).
pub fn handle_activation_key(state: &mut GameState, key: u8) -> Option<TimingQuality> {
    if state.phase != GamePhase::Playing {
        return None;
    }
    let index = state.towers.iter().position(|t| t.key == key)?;
    if state.towers[index].cooldown_ms > 0.0 {
        log::debug!("Tower on key {} still cooling down", key);
        return None;
    }

    let quality = state.rhythm.check_timing(state.elapsed_ms);
    activate_tower(state, index, quality);
    Some(quality)
}

/// Fire a tower with an already judged quality.
///
/// The effect resolves with the combo as it stood before the press; the combo
/// is updated afterwards.
pub fn activate_tower(state: &mut GameState, index: usize, quality: TimingQuality) {
    let now = state.elapsed_ms;
    let multiplier = quality.multiplier();
    let cooldown = state.config.activation_cooldown_ms;

    let Some(tower) = state.towers.get_mut(index) else {
        return;
    };
    tower.active = true;
    tower.activated_at = now;
    tower.cooldown_ms = cooldown;
    let (id, kind, cell) = (tower.id, tower.kind, tower.cell);

    match kind {
        TowerKind::Beam => apply_beam(state, kind, cell, multiplier),
        TowerKind::Pulse => apply_pulse(state, kind, cell, multiplier),
        TowerKind::Shield => apply_shield(state, kind, cell, multiplier),
        TowerKind::Boost => apply_boost(state, kind, cell, multiplier),
    }

    if quality.is_hit() {
        state.combo += 1;
    } else {
        state.combo = 0;
    }
    state.push_event(GameEvent::TowerActivated { id, quality });
}

fn push_effect(state: &mut GameState, kind: TowerKind, effect: EffectKind, cell: Cell, duration_ms: f64) {
    let color = state.config.towers.get(kind).color.clone();
    state.effects.push(Effect {
        kind: effect,
        pos: cell.as_vec2(),
        started_at: state.elapsed_ms,
        duration_ms,
        color,
    });
}

/// Damage every enemy on the tower's row to its right, at any distance
fn apply_beam(state: &mut GameState, kind: TowerKind, cell: Cell, multiplier: f64) {
    let damage = state.config.towers.get(kind).damage * multiplier;
    push_effect(state, kind, EffectKind::Beam, cell, BEAM_EFFECT_MS);

    let targets: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| e.row() == cell.y && e.pos.x > cell.x as f32)
        .map(|e| e.id)
        .collect();
    for id in targets {
        damage_enemy(state, id, damage);
    }
}

/// Damage every enemy within range
fn apply_pulse(state: &mut GameState, kind: TowerKind, cell: Cell, multiplier: f64) {
    let stats = state.config.towers.get(kind);
    let (damage, range) = (stats.damage * multiplier, stats.range);
    push_effect(state, kind, EffectKind::Pulse { range }, cell, PULSE_EFFECT_MS);

    let center = cell.as_vec2();
    let targets: Vec<u32> = state
        .enemies
        .iter()
        .filter(|e| e.pos.distance(center) <= range)
        .map(|e| e.id)
        .collect();
    for id in targets {
        damage_enemy(state, id, damage);
    }
}

/// Slow every enemy within range; no damage
fn apply_shield(state: &mut GameState, kind: TowerKind, cell: Cell, multiplier: f64) {
    let range = state.config.towers.get(kind).range;
    let duration = SHIELD_BASE_MS * multiplier;
    push_effect(state, kind, EffectKind::Shield { range }, cell, duration);

    let now = state.elapsed_ms;
    let center = cell.as_vec2();
    for enemy in state
        .enemies
        .iter_mut()
        .filter(|e| e.pos.distance(center) <= range)
    {
        enemy.slowed = true;
        enemy.slow_started_at = now;
        enemy.slow_duration_ms = duration;
    }
}

/// Flag the towers in the eight neighbouring cells as boosted
fn apply_boost(state: &mut GameState, kind: TowerKind, cell: Cell, multiplier: f64) {
    let range = state.config.towers.get(kind).range;
    let duration = BOOST_BASE_MS * multiplier;
    push_effect(state, kind, EffectKind::Boost { range }, cell, duration);

    let now = state.elapsed_ms;
    let neighbors: Vec<u32> = cell
        .neighbors()
        .filter_map(|n| state.grid.tower_at(n))
        .collect();
    for tower in state
        .towers
        .iter_mut()
        .filter(|t| neighbors.contains(&t.id))
    {
        tower.boosted = true;
        tower.boost_started_at = now;
        tower.boost_duration_ms = duration;
    }
}

/// Expire tower status and finished effects
pub fn update_towers(state: &mut GameState, dt_ms: f64) {
    let now = state.elapsed_ms;
    for tower in &mut state.towers {
        if tower.cooldown_ms > 0.0 {
            tower.cooldown_ms = (tower.cooldown_ms - dt_ms).max(0.0);
        }
        if tower.active && now - tower.activated_at > TOWER_ACTIVE_MS {
            tower.active = false;
        }
        if tower.boosted && now - tower.boost_started_at > tower.boost_duration_ms {
            tower.boosted = false;
        }
    }
    state.effects.retain(|e| !e.is_expired(now));
}
