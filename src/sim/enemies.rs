//! Enemy movement, damage and removal

use super::state::{Effect, EffectKind, Enemy, GameEvent, GameState};
use crate::config::EnemyKind;
use crate::consts::*;

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// No live enemy with that id
    Missing,
    Hit,
    /// Health reached zero; the enemy was removed
    Defeated { score: u64 },
}

/// Put a new enemy at the start of the path
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind) -> u32 {
    let id = state.next_entity_id();
    let health = state.config.enemies.get(kind).health;
    let pos = state.path.point_at(0, 0.0);
    state.enemies.push(Enemy {
        id,
        kind,
        health,
        max_health: health,
        pos,
        path_index: 0,
        progress: 0.0,
        slowed: false,
        slow_started_at: 0.0,
        slow_duration_ms: 0.0,
    });
    log::debug!("Spawned {} #{}", kind.as_str(), id);
    state.push_event(GameEvent::EnemySpawned { id, kind });
    id
}

/// Subtract `amount` from an enemy's health, removing it at zero.
///
/// Non-positive amounts are ignored so health never rises.
pub fn damage_enemy(state: &mut GameState, id: u32, amount: f64) -> DamageOutcome {
    let Some(index) = state.enemies.iter().position(|e| e.id == id) else {
        return DamageOutcome::Missing;
    };
    if amount > 0.0 {
        state.enemies[index].health -= amount;
    }
    state.push_event(GameEvent::EnemyHit { id });

    if state.enemies[index].health <= 0.0 {
        let score = defeat_enemy(state, index);
        DamageOutcome::Defeated { score }
    } else {
        DamageOutcome::Hit
    }
}

/// Remove a defeated enemy and pay out score and resources
fn defeat_enemy(state: &mut GameState, index: usize) -> u64 {
    let enemy = state.enemies.remove(index);
    let base = state.config.enemies.get(enemy.kind).health;
    let combo_multiplier = 1.0 + state.combo as f64 * 0.1;
    let score = (base * combo_multiplier).floor() as u64;

    state.score += score;
    state.resources += (base / 10.0).floor() as u32;
    state.effects.push(Effect {
        kind: EffectKind::ScorePopup { value: score },
        pos: enemy.pos,
        started_at: state.elapsed_ms,
        duration_ms: SCORE_POPUP_MS,
        color: "#ffffff".to_string(),
    });
    state.push_event(GameEvent::EnemyDefeated {
        id: enemy.id,
        score,
    });
    score
}

/// Move every enemy one step along the path.
///
/// Enemies finishing the last segment escape and cost a life. At most one
/// vertex is crossed per step.
pub fn move_enemies(state: &mut GameState, dt_ms: f64) {
    let now = state.elapsed_ms;
    let mut escaped = Vec::new();

    for enemy in &mut state.enemies {
        let base_speed = state.config.enemies.get(enemy.kind).speed;
        let speed = if enemy.is_slowed(now) {
            base_speed * SLOW_FACTOR
        } else {
            enemy.slowed = false;
            base_speed
        };

        let length = state.path.segment_length(enemy.path_index);
        if length > 0.0 {
            enemy.progress += speed * dt_ms as f32 / (length * SPEED_TIME_SCALE);
        } else {
            // Zero-length segment: treat as already traversed
            enemy.progress = 1.0;
        }

        if enemy.progress >= 1.0 {
            if state.path.is_last_segment(enemy.path_index) {
                escaped.push(enemy.id);
                continue;
            }
            enemy.path_index += 1;
            enemy.progress = 0.0;
        }
        enemy.pos = state.path.point_at(enemy.path_index, enemy.progress);
    }

    for id in escaped {
        escape_enemy(state, id);
    }
}

/// Remove an enemy that reached the end and take a life
fn escape_enemy(state: &mut GameState, id: u32) {
    state.enemies.retain(|e| e.id != id);
    state.lives -= 1;
    log::debug!("Enemy #{} escaped, {} lives left", id, state.lives);
    state.push_event(GameEvent::EnemyEscaped { id });
    if state.lives <= 0 {
        state.finish(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::grid::Cell;
    use crate::sim::state::GamePhase;
    use glam::Vec2;
    use proptest::prelude::*;

    fn state() -> GameState {
        GameState::new(GameConfig::default())
    }

    #[test]
    fn test_spawn_at_path_start() {
        let mut state = state();
        let id = spawn_enemy(&mut state, EnemyKind::Tank);
        let enemy = state.enemy(id).unwrap();
        assert_eq!(enemy.pos, Vec2::new(0.0, 3.0));
        assert_eq!(enemy.health, 80.0);
        assert_eq!(enemy.path_index, 0);
    }

    #[test]
    fn test_defeat_reward_with_combo() {
        let mut state = state();
        state.combo = 2;
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        assert_eq!(damage_enemy(&mut state, id, 10.0), DamageOutcome::Hit);
        assert_eq!(state.score, 0);
        assert_eq!(
            damage_enemy(&mut state, id, 25.0),
            DamageOutcome::Defeated { score: 36 }
        );
        assert_eq!(state.score, 36);
        assert_eq!(state.resources, 103);
        assert!(state.enemies.is_empty());
        assert!(
            state
                .effects
                .iter()
                .any(|e| e.kind == EffectKind::ScorePopup { value: 36 })
        );
    }

    #[test]
    fn test_removed_exactly_once() {
        let mut state = state();
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        assert!(matches!(
            damage_enemy(&mut state, id, 100.0),
            DamageOutcome::Defeated { .. }
        ));
        assert_eq!(damage_enemy(&mut state, id, 100.0), DamageOutcome::Missing);
        assert_eq!(state.score, 30);
    }

    #[test]
    fn test_move_interpolates() {
        let mut state = state();
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        // Runner: 2 cells/s over a 3-cell segment -> 750 ms for half
        move_enemies(&mut state, 750.0);
        let enemy = state.enemy(id).unwrap();
        assert!((enemy.progress - 0.5).abs() < 1e-5);
        assert!((enemy.pos.x - 1.5).abs() < 1e-4);
        assert_eq!(enemy.pos.y, 3.0);
    }

    #[test]
    fn test_slow_halves_speed_then_expires() {
        let mut state = state();
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        {
            let enemy = &mut state.enemies[0];
            enemy.slowed = true;
            enemy.slow_started_at = 0.0;
            enemy.slow_duration_ms = 1000.0;
        }
        move_enemies(&mut state, 750.0);
        assert!((state.enemy(id).unwrap().progress - 0.25).abs() < 1e-5);

        state.elapsed_ms = 1000.0;
        move_enemies(&mut state, 750.0);
        let enemy = state.enemy(id).unwrap();
        assert!(!enemy.slowed);
        assert!((enemy.progress - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_snap_to_vertex() {
        let mut state = state();
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        move_enemies(&mut state, 2000.0);
        let enemy = state.enemy(id).unwrap();
        assert_eq!(enemy.path_index, 1);
        assert_eq!(enemy.progress, 0.0);
        assert_eq!(enemy.pos, Cell::new(3, 3).as_vec2());
    }

    #[test]
    fn test_zero_length_segment_skipped() {
        let config = GameConfig {
            path: vec![Cell::new(0, 0), Cell::new(0, 0), Cell::new(4, 0)],
            ..GameConfig::default()
        };
        let mut state = GameState::new(config);
        let id = spawn_enemy(&mut state, EnemyKind::Runner);
        move_enemies(&mut state, 16.0);
        let enemy = state.enemy(id).unwrap();
        assert_eq!(enemy.path_index, 1);
        assert!(enemy.pos.is_finite());
    }

    #[test]
    fn test_escape_costs_life() {
        let mut state = state();
        state.lives = 2;
        spawn_enemy(&mut state, EnemyKind::Runner);
        state.enemies[0].path_index = 4;
        state.enemies[0].progress = 0.99;
        move_enemies(&mut state, 100.0);
        assert!(state.enemies.is_empty());
        assert_eq!(state.lives, 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = state();
        state.lives = 1;
        spawn_enemy(&mut state, EnemyKind::Runner);
        state.enemies[0].path_index = 4;
        state.enemies[0].progress = 0.99;
        move_enemies(&mut state, 100.0);
        assert_eq!(state.lives, 0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    proptest! {
        #[test]
        fn prop_health_never_increases(hits in prop::collection::vec(-20.0f64..20.0, 1..20)) {
            let mut state = state();
            let id = spawn_enemy(&mut state, EnemyKind::Tank);
            let mut last = 80.0;
            let mut defeats = 0;
            for amount in hits {
                match damage_enemy(&mut state, id, amount) {
                    DamageOutcome::Defeated { .. } => defeats += 1,
                    DamageOutcome::Hit => {
                        let health = state.enemy(id).unwrap().health;
                        prop_assert!(health <= last);
                        last = health;
                    }
                    DamageOutcome::Missing => {}
                }
            }
            prop_assert!(defeats <= 1);
        }
    }
}
