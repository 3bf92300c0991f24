//! Beat schedule and timing judge
//!
//! Markers are emitted once per beat interval and slide toward the activation
//! line. A marker's position is derived from its age:
//! `(now - created_at) / interval`, with 1.0 being the ideal hit.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Categorical judgement of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingQuality {
    Perfect,
    Good,
    Miss,
}

impl TimingQuality {
    /// Damage/duration multiplier for this quality
    pub fn multiplier(&self) -> f64 {
        match self {
            TimingQuality::Perfect => 2.0,
            TimingQuality::Good => 1.5,
            TimingQuality::Miss => 0.5,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, TimingQuality::Miss)
    }
}

/// One musical pulse on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatMarker {
    /// Elapsed time (ms) when the beat fired
    pub created_at: f64,
    /// Cleared once a key press scores against this marker
    pub active: bool,
}

impl BeatMarker {
    #[inline]
    pub fn position(&self, now: f64, interval: f64) -> f64 {
        (now - self.created_at) / interval
    }
}

/// Beat scheduler and timing judge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RhythmJudge {
    interval_ms: f64,
    next_beat_ms: f64,
    markers: Vec<BeatMarker>,
}

impl RhythmJudge {
    /// First beat fires one interval after `start_ms`
    pub fn new(bpm: f64, start_ms: f64) -> Self {
        let interval_ms = 60_000.0 / bpm;
        Self {
            interval_ms,
            next_beat_ms: start_ms + interval_ms,
            markers: Vec::new(),
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn next_beat_ms(&self) -> f64 {
        self.next_beat_ms
    }

    pub fn markers(&self) -> &[BeatMarker] {
        &self.markers
    }

    /// Advance the schedule to `now`. Returns true if a beat fired.
    ///
    /// At most one marker per call; the schedule moves by exactly one interval
    /// so late frames don't accumulate drift.
    pub fn advance(&mut self, now: f64) -> bool {
        let fired = now >= self.next_beat_ms;
        if fired {
            self.spawn_marker(now);
            self.next_beat_ms += self.interval_ms;
        }
        self.prune(now);
        fired
    }

    /// Add a marker created at `now`
    pub fn spawn_marker(&mut self, now: f64) {
        self.markers.push(BeatMarker {
            created_at: now,
            active: true,
        });
    }

    /// Drop markers that have slid past the cutoff
    pub fn prune(&mut self, now: f64) {
        let interval = self.interval_ms;
        self.markers
            .retain(|m| m.position(now, interval) <= MARKER_CUTOFF);
    }

    /// Judge a key press at `action_time` against the nearest active marker.
    ///
    /// A perfect or good judgement consumes the marker; a miss leaves every
    /// marker untouched.
    pub fn check_timing(&mut self, action_time: f64) -> TimingQuality {
        let interval = self.interval_ms;
        let mut closest: Option<(usize, f64)> = None;

        for (i, marker) in self.markers.iter().enumerate() {
            if !marker.active {
                continue;
            }
            let position = marker.position(action_time, interval);
            if !(JUDGE_WINDOW_MIN..=JUDGE_WINDOW_MAX).contains(&position) {
                continue;
            }
            let distance = (position - IDEAL_POSITION).abs();
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((i, distance));
            }
        }

        let Some((index, distance)) = closest else {
            return TimingQuality::Miss;
        };

        let quality = if distance <= PERFECT_WINDOW {
            TimingQuality::Perfect
        } else if distance <= GOOD_WINDOW {
            TimingQuality::Good
        } else {
            TimingQuality::Miss
        };

        if quality.is_hit() {
            self.markers[index].active = false;
        }
        quality
    }
}
