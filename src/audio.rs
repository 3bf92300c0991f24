//! Audio cues
//!
//! Procedurally generated sound effects using the Web Audio API - no external
//! files needed. The event-to-cue mapping is platform independent; playback
//! only exists in the browser.

use crate::sim::{GameEvent, TimingQuality};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Metronome tick on every beat
    Beat,
    /// Tower fired on a perfect hit
    Perfect,
    /// Tower fired on a good hit
    Good,
    /// Tower fired off the beat
    Miss,
    TowerPlace,
    EnemyHit,
    EnemyDefeat,
    /// Enemy reached the end of the path
    LifeLost,
    WaveStart,
    WaveClear,
    GameOver,
    Victory,
    /// New high score
    HighScore,
}

impl SoundEffect {
    /// Cue for a simulation event, if it has one
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        let effect = match event {
            GameEvent::Beat => SoundEffect::Beat,
            GameEvent::TowerPlaced { .. } => SoundEffect::TowerPlace,
            GameEvent::TowerActivated { quality, .. } => match quality {
                TimingQuality::Perfect => SoundEffect::Perfect,
                TimingQuality::Good => SoundEffect::Good,
                TimingQuality::Miss => SoundEffect::Miss,
            },
            GameEvent::EnemySpawned { .. } => return None,
            GameEvent::EnemyHit { .. } => SoundEffect::EnemyHit,
            GameEvent::EnemyDefeated { .. } => SoundEffect::EnemyDefeat,
            GameEvent::EnemyEscaped { .. } => SoundEffect::LifeLost,
            GameEvent::WaveStarted { .. } => SoundEffect::WaveStart,
            GameEvent::WaveCompleted { .. } => SoundEffect::WaveClear,
            GameEvent::GameOver { victory: true, .. } => SoundEffect::Victory,
            GameEvent::GameOver { victory: false, .. } => SoundEffect::GameOver,
        };
        Some(effect)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::SoundEffect;
    use crate::settings::Settings;
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
        metronome: bool,
    }

    impl AudioManager {
        pub fn from_settings(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: settings.effective_volume(),
                metronome: settings.metronome_enabled(),
            }
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.volume = settings.effective_volume();
            self.metronome = settings.metronome_enabled();
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let vol = self.volume;
            if vol <= 0.0 {
                return;
            }
            if effect == SoundEffect::Beat && !self.metronome {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Beat => self.blip(ctx, 880.0, OscillatorType::Square, vol * 0.08, 0.03),
                SoundEffect::Perfect => self.arpeggio(ctx, &[880.0, 1320.0], OscillatorType::Triangle, vol * 0.3, 0.05),
                SoundEffect::Good => self.blip(ctx, 660.0, OscillatorType::Triangle, vol * 0.25, 0.1),
                SoundEffect::Miss => self.sweep(ctx, 220.0, 110.0, OscillatorType::Sawtooth, vol * 0.2, 0.15),
                SoundEffect::TowerPlace => self.sweep(ctx, 200.0, 400.0, OscillatorType::Sine, vol * 0.3, 0.1),
                SoundEffect::EnemyHit => self.blip(ctx, 300.0, OscillatorType::Triangle, vol * 0.2, 0.05),
                SoundEffect::EnemyDefeat => self.sweep(ctx, 500.0, 80.0, OscillatorType::Square, vol * 0.25, 0.2),
                SoundEffect::LifeLost => self.sweep(ctx, 300.0, 40.0, OscillatorType::Sine, vol * 0.4, 0.5),
                SoundEffect::WaveStart => self.arpeggio(ctx, &[300.0, 400.0, 500.0], OscillatorType::Triangle, vol * 0.3, 0.08),
                SoundEffect::WaveClear => self.arpeggio(ctx, &[400.0, 500.0, 600.0, 800.0], OscillatorType::Triangle, vol * 0.3, 0.1),
                SoundEffect::GameOver => self.arpeggio(ctx, &[400.0, 350.0, 300.0, 200.0], OscillatorType::Sine, vol * 0.3, 0.2),
                SoundEffect::Victory => self.arpeggio(ctx, &[500.0, 600.0, 800.0, 1000.0, 1200.0], OscillatorType::Triangle, vol * 0.3, 0.1),
                SoundEffect::HighScore => self.arpeggio(ctx, &[500.0, 600.0, 700.0, 800.0, 1000.0], OscillatorType::Triangle, vol * 0.25, 0.08),
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single decaying tone
        fn blip(&self, ctx: &AudioContext, freq: f32, osc_type: OscillatorType, level: f32, length: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + length + 0.02).ok();
        }

        /// Tone gliding from one pitch to another
        fn sweep(
            &self,
            ctx: &AudioContext,
            from: f32,
            to: f32,
            osc_type: OscillatorType,
            level: f32,
            length: f64,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(level, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + length)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + length)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + length + 0.05).ok();
        }

        /// Notes played one after another
        fn arpeggio(&self, ctx: &AudioContext, notes: &[f32], osc_type: OscillatorType, level: f32, step: f64) {
            for (i, freq) in notes.iter().enumerate() {
                let delay = i as f64 * step;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, osc_type) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(level, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + step * 3.0)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + step * 3.0 + 0.05).ok();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_cues_follow_quality() {
        let cue = |quality| SoundEffect::from_event(&GameEvent::TowerActivated { id: 1, quality });
        assert_eq!(cue(TimingQuality::Perfect), Some(SoundEffect::Perfect));
        assert_eq!(cue(TimingQuality::Good), Some(SoundEffect::Good));
        assert_eq!(cue(TimingQuality::Miss), Some(SoundEffect::Miss));
    }

    #[test]
    fn test_spawns_are_silent() {
        let event = GameEvent::EnemySpawned {
            id: 3,
            kind: crate::config::EnemyKind::Runner,
        };
        assert_eq!(SoundEffect::from_event(&event), None);
    }

    #[test]
    fn test_game_over_cue() {
        let won = GameEvent::GameOver { victory: true, score: 10 };
        let lost = GameEvent::GameOver { victory: false, score: 10 };
        assert_eq!(SoundEffect::from_event(&won), Some(SoundEffect::Victory));
        assert_eq!(SoundEffect::from_event(&lost), Some(SoundEffect::GameOver));
    }
}
