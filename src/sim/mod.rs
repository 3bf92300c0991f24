//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `tick`
//! - Seeded RNG only
//! - Stable iteration order (placement order for towers, spawn order for enemies)
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod clock;
pub mod enemies;
pub mod grid;
pub mod rhythm;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod towers;
pub mod waves;

pub use autoplay::AutoPlayer;
pub use clock::FrameClock;
pub use enemies::{DamageOutcome, damage_enemy, move_enemies, spawn_enemy};
pub use grid::{Cell, Grid, Path};
pub use rhythm::{BeatMarker, RhythmJudge, TimingQuality};
pub use snapshot::RenderSnapshot;
pub use state::{Effect, EffectKind, Enemy, GameEvent, GamePhase, GameState, Tower};
pub use tick::{InputEvent, TickInput, apply_input, tick};
pub use towers::{PlacementError, activate_tower, handle_activation_key, place_tower, remove_tower};
pub use waves::{Wave, WaveState, start_wave};
