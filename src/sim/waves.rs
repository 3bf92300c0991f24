//! Wave rosters and the spawn queue
//!
//! Spawns are a sorted queue drained against simulation time, so waves
//! fast-forward and replay deterministically.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::enemies::spawn_enemy;
use super::state::{GameEvent, GameState};
use crate::config::EnemyKind;
use crate::consts::{SPAWN_SPACING_MS, WAVE_BONUS_PER_WAVE};

/// One roster entry: what to spawn and how long after the wave starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub kind: EnemyKind,
    pub delay_ms: f64,
}

/// A wave's full roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub number: u32,
    pub spawns: Vec<SpawnEntry>,
}

impl Wave {
    /// Deterministic roster for wave `number`
    pub fn generate(number: u32) -> Self {
        let count = enemy_count(number);
        let spawns = (0..count)
            .map(|i| SpawnEntry {
                kind: enemy_kind_for(number, i),
                delay_ms: i as f64 * SPAWN_SPACING_MS,
            })
            .collect();
        Self { number, spawns }
    }
}

pub fn enemy_count(wave: u32) -> u32 {
    5 + 2 * wave
}

/// Every 5th enemy is a tank from wave 3, every 7th a flyer from wave 5.
/// Tanks win when both apply.
pub fn enemy_kind_for(wave: u32, index: u32) -> EnemyKind {
    if wave >= 3 && index % 5 == 0 {
        EnemyKind::Tank
    } else if wave >= 5 && index % 7 == 0 {
        EnemyKind::Flyer
    } else {
        EnemyKind::Runner
    }
}

/// A queued spawn at an absolute simulation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSpawn {
    pub at_ms: f64,
    pub kind: EnemyKind,
}

/// Progress of the current wave
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveState {
    /// Wave being played, or the next one to start
    pub number: u32,
    pub in_progress: bool,
    pub started_at: f64,
    /// Pending spawns, sorted by time
    pub queue: VecDeque<ScheduledSpawn>,
}

impl WaveState {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            in_progress: false,
            started_at: 0.0,
            queue: VecDeque::new(),
        }
    }

    pub fn pending_spawns(&self) -> usize {
        self.queue.len()
    }
}

/// Start the current wave. Returns false if one is running or the game is over.
pub fn start_wave(state: &mut GameState) -> bool {
    if state.wave.in_progress || state.phase.is_over() {
        return false;
    }
    let now = state.elapsed_ms;
    let roster = Wave::generate(state.wave.number);
    state.wave.queue = roster
        .spawns
        .iter()
        .map(|s| ScheduledSpawn {
            at_ms: now + s.delay_ms,
            kind: s.kind,
        })
        .collect();
    state.wave.in_progress = true;
    state.wave.started_at = now;

    log::info!(
        "Starting wave {} ({} enemies)",
        roster.number,
        roster.spawns.len()
    );
    state.push_event(GameEvent::WaveStarted {
        wave: roster.number,
    });
    true
}

/// Spawn everything whose time has come. Returns the number spawned.
pub fn fire_due_spawns(state: &mut GameState) -> usize {
    let mut spawned = 0;
    while let Some(next) = state.wave.queue.front().copied() {
        if next.at_ms > state.elapsed_ms {
            break;
        }
        state.wave.queue.pop_front();
        spawn_enemy(state, next.kind);
        spawned += 1;
    }
    spawned
}

/// Complete the wave once the queue is drained and the field is clear.
///
/// Awards `wave * 10` resources, then either moves to the next wave or ends
/// the game in victory.
pub fn check_wave_complete(state: &mut GameState) -> bool {
    if !state.wave.in_progress || !state.wave.queue.is_empty() || !state.enemies.is_empty() {
        return false;
    }

    let wave = state.wave.number;
    let bonus = wave * WAVE_BONUS_PER_WAVE;
    state.wave.in_progress = false;
    state.resources += bonus;
    log::info!("Wave {} complete! +{} resources", wave, bonus);
    state.push_event(GameEvent::WaveCompleted { wave, bonus });

    if wave >= state.config.max_waves {
        state.finish(true);
    } else {
        state.wave.number += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::state::GamePhase;
    use proptest::prelude::*;

    #[test]
    fn test_wave_one_all_runners() {
        let wave = Wave::generate(1);
        assert_eq!(wave.spawns.len(), 7);
        assert!(wave.spawns.iter().all(|s| s.kind == EnemyKind::Runner));
        assert_eq!(wave.spawns[3].delay_ms, 6000.0);
    }

    #[test]
    fn test_wave_five_roster() {
        let wave = Wave::generate(5);
        assert_eq!(wave.spawns.len(), 15);
        assert_eq!(wave.spawns[0].kind, EnemyKind::Tank);
        assert_eq!(wave.spawns[5].kind, EnemyKind::Tank);
        assert_eq!(wave.spawns[7].kind, EnemyKind::Flyer);
        assert_eq!(wave.spawns[1].kind, EnemyKind::Runner);
    }

    #[test]
    fn test_tank_beats_flyer_on_shared_index() {
        // 35 is a multiple of both 5 and 7
        assert_eq!(enemy_kind_for(5, 35), EnemyKind::Tank);
        assert_eq!(enemy_kind_for(15, 35), EnemyKind::Tank);
        assert_eq!(enemy_kind_for(5, 14), EnemyKind::Flyer);
    }

    #[test]
    fn test_no_specials_before_wave_three() {
        assert_eq!(enemy_kind_for(2, 0), EnemyKind::Runner);
        assert_eq!(enemy_kind_for(4, 7), EnemyKind::Runner);
        assert_eq!(enemy_kind_for(3, 10), EnemyKind::Tank);
    }

    #[test]
    fn test_spawns_fire_against_elapsed_time() {
        let mut state = GameState::new(GameConfig::default());
        state.elapsed_ms = 1000.0;
        assert!(start_wave(&mut state));
        assert!(!start_wave(&mut state));
        assert_eq!(state.wave.pending_spawns(), 7);

        assert_eq!(fire_due_spawns(&mut state), 1);
        state.elapsed_ms = 2999.0;
        assert_eq!(fire_due_spawns(&mut state), 0);
        state.elapsed_ms = 5000.0;
        assert_eq!(fire_due_spawns(&mut state), 2);
        assert_eq!(state.enemies.len(), 3);
        assert_eq!(state.wave.pending_spawns(), 4);
    }

    #[test]
    fn test_complete_requires_empty_queue_and_field() {
        let mut state = GameState::new(GameConfig::default());
        assert!(!check_wave_complete(&mut state));

        start_wave(&mut state);
        fire_due_spawns(&mut state);
        assert!(!check_wave_complete(&mut state));

        state.enemies.clear();
        assert!(!check_wave_complete(&mut state));

        state.wave.queue.clear();
        assert!(check_wave_complete(&mut state));
        assert_eq!(state.resources, 110);
        assert_eq!(state.wave.number, 2);
        assert!(!state.wave.in_progress);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_final_wave_is_victory() {
        let config = GameConfig {
            initial_wave: 3,
            max_waves: 3,
            ..GameConfig::default()
        };
        let mut state = GameState::new(config);
        start_wave(&mut state);
        state.wave.queue.clear();
        assert!(check_wave_complete(&mut state));
        assert_eq!(state.resources, 130);
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(!start_wave(&mut state));
    }

    proptest! {
        #[test]
        fn prop_roster_shape(wave in 1u32..40) {
            let roster = Wave::generate(wave);
            prop_assert_eq!(roster.spawns.len() as u32, 5 + 2 * wave);
            for (i, s) in roster.spawns.iter().enumerate() {
                prop_assert_eq!(s.delay_ms, i as f64 * 2000.0);
                if wave < 3 {
                    prop_assert_eq!(s.kind, EnemyKind::Runner);
                }
            }
        }
    }
}
