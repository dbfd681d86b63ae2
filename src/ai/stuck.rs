//! Stuck detection
//!
//! A bot that wants to move but has not covered `distance_threshold` for
//! longer than `time_threshold_ms` is stuck. Each detection resets the
//! accumulator and opens a cooldown window, so a pinned bot triggers one
//! recovery per window instead of one per tick.

use bevy::prelude::*;

use crate::ai::decision::AgentNavState;
use crate::constants::*;

/// Result of one detector update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StuckStatus {
    /// Moved at least the distance threshold since the last update
    Progressing,
    /// No progress yet, time is accumulating
    Stalled,
    /// Threshold exceeded outside the cooldown window
    Stuck,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StuckDetector {
    pub distance_threshold: f32,
    pub time_threshold_ms: f32,
    pub cooldown_ms: f32,
}

impl Default for StuckDetector {
    fn default() -> Self {
        Self {
            distance_threshold: STUCK_DISTANCE_THRESHOLD,
            time_threshold_ms: STUCK_TIME_THRESHOLD_MS,
            cooldown_ms: STUCK_COOLDOWN_MS,
        }
    }
}

impl StuckDetector {
    /// Feed the position for this tick. `state.clock_ms` must already include `dt_ms`.
    /// A bot with no previous position counts as not having moved.
    pub fn update(&self, state: &mut AgentNavState, position: Vec2, dt_ms: f32) -> StuckStatus {
        let last = *state.last_known_position.get_or_insert(position);

        if last.distance(position) >= self.distance_threshold {
            state.last_known_position = Some(position);
            state.stuck_accumulated_ms = 0.0;
            state.last_progress_ms = state.clock_ms;
            return StuckStatus::Progressing;
        }

        state.stuck_accumulated_ms += dt_ms;

        if state.stuck_accumulated_ms > self.time_threshold_ms
            && state.clock_ms >= state.cooldown_until_ms
        {
            state.stuck_accumulated_ms = 0.0;
            state.cooldown_until_ms = state.clock_ms + self.cooldown_ms;
            return StuckStatus::Stuck;
        }

        StuckStatus::Stalled
    }

    /// Bot is not trying to move: standing still is not a lack of progress
    pub fn rest(&self, state: &mut AgentNavState, position: Vec2) {
        state.last_known_position = Some(position);
        state.stuck_accumulated_ms = 0.0;
        state.last_progress_ms = state.clock_ms;
    }
}
