//! Bot tuning settings loaded from config/bot_tuning.json

use bevy::log::warn;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ai::{JumpProfile, LocateTolerance, StuckDetector};
use crate::constants::*;

// Serde default functions, so older config files keep loading
fn default_move_speed() -> f32 {
    MOVE_SPEED
}
fn default_jump_strength() -> f32 {
    JUMP_STRENGTH
}
fn default_acceleration_factor() -> f32 {
    ACCELERATION_FACTOR
}
fn default_deceleration_factor() -> f32 {
    DECELERATION_FACTOR
}
fn default_jump_velocity_threshold() -> f32 {
    JUMP_VELOCITY_THRESHOLD
}
fn default_jump_reach() -> f32 {
    JUMP_REACH
}
fn default_jump_height() -> f32 {
    JUMP_HEIGHT
}
fn default_stuck_distance_threshold() -> f32 {
    STUCK_DISTANCE_THRESHOLD
}
fn default_stuck_time_threshold() -> f32 {
    STUCK_TIME_THRESHOLD_MS
}
fn default_stuck_cooldown() -> f32 {
    STUCK_COOLDOWN_MS
}
fn default_recompute_interval() -> f32 {
    RECOMPUTE_INTERVAL_MS
}
fn default_horizontal_dead_zone() -> f32 {
    HORIZONTAL_DEAD_ZONE
}
fn default_jump_margin() -> f32 {
    JUMP_MARGIN
}
fn default_standing_tolerance() -> f32 {
    STANDING_TOLERANCE
}
fn default_lateral_tolerance() -> f32 {
    LATERAL_TOLERANCE
}
fn default_edge_margin() -> f32 {
    EDGE_MARGIN
}
fn default_edge_jump_margin() -> f32 {
    EDGE_JUMP_MARGIN
}
fn default_ceiling_clearance() -> f32 {
    CEILING_CLEARANCE
}

/// Path to bot tuning config
pub const BOT_TUNING_FILE: &str = "config/bot_tuning.json";

/// Tuning values for the navigation core and the reference actuator
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotTuning {
    // Actuator
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default = "default_jump_strength")]
    pub jump_strength: f32,
    #[serde(default = "default_acceleration_factor")]
    pub acceleration_factor: f32,
    #[serde(default = "default_deceleration_factor")]
    pub deceleration_factor: f32,
    #[serde(default = "default_jump_velocity_threshold")]
    pub jump_velocity_threshold: f32,

    // Jump profile
    #[serde(default = "default_jump_reach")]
    pub jump_reach: f32,
    #[serde(default = "default_jump_height")]
    pub jump_height: f32,
    /// Deepest fall a fall edge may span (None = unbounded)
    #[serde(default)]
    pub max_fall: Option<f32>,

    // Stuck detection
    #[serde(default = "default_stuck_distance_threshold")]
    pub stuck_distance_threshold: f32,
    #[serde(default = "default_stuck_time_threshold")]
    pub stuck_time_threshold_ms: f32,
    #[serde(default = "default_stuck_cooldown")]
    pub stuck_cooldown_ms: f32,

    // Decision policy
    #[serde(default = "default_recompute_interval")]
    pub recompute_interval_ms: f32,
    #[serde(default = "default_horizontal_dead_zone")]
    pub horizontal_dead_zone: f32,
    #[serde(default = "default_jump_margin")]
    pub jump_margin: f32,
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f32,
    #[serde(default = "default_edge_jump_margin")]
    pub edge_jump_margin: f32,
    #[serde(default = "default_ceiling_clearance")]
    pub ceiling_clearance: f32,

    // Localization
    #[serde(default = "default_standing_tolerance")]
    pub standing_tolerance: f32,
    #[serde(default = "default_lateral_tolerance")]
    pub lateral_tolerance: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            jump_strength: default_jump_strength(),
            acceleration_factor: default_acceleration_factor(),
            deceleration_factor: default_deceleration_factor(),
            jump_velocity_threshold: default_jump_velocity_threshold(),
            jump_reach: default_jump_reach(),
            jump_height: default_jump_height(),
            max_fall: None,
            stuck_distance_threshold: default_stuck_distance_threshold(),
            stuck_time_threshold_ms: default_stuck_time_threshold(),
            stuck_cooldown_ms: default_stuck_cooldown(),
            recompute_interval_ms: default_recompute_interval(),
            horizontal_dead_zone: default_horizontal_dead_zone(),
            jump_margin: default_jump_margin(),
            edge_margin: default_edge_margin(),
            edge_jump_margin: default_edge_jump_margin(),
            ceiling_clearance: default_ceiling_clearance(),
            standing_tolerance: default_standing_tolerance(),
            lateral_tolerance: default_lateral_tolerance(),
        }
    }
}

impl BotTuning {
    pub fn jump_profile(&self) -> JumpProfile {
        JumpProfile::new(self.jump_reach, self.jump_height)
            .with_max_fall(self.max_fall)
            .with_jump_margin(self.jump_margin)
    }

    pub fn locate_tolerance(&self) -> LocateTolerance {
        LocateTolerance {
            lateral: self.lateral_tolerance,
            standing: self.standing_tolerance,
        }
    }

    pub fn stuck_detector(&self) -> StuckDetector {
        StuckDetector {
            distance_threshold: self.stuck_distance_threshold,
            time_threshold_ms: self.stuck_time_threshold_ms,
            cooldown_ms: self.stuck_cooldown_ms,
        }
    }

    /// Is the body's vertical speed low enough to start a jump?
    pub fn is_settled(&self, vertical_speed: f32) -> bool {
        vertical_speed.abs() < self.jump_velocity_threshold
    }
}

pub fn load_bot_tuning_from_file(path: &str) -> Result<BotTuning, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?;
    serde_json::from_str(&contents).map_err(|e| format!("Failed to parse {}: {}", path, e))
}

/// Load tuning, falling back to defaults with a warning
pub fn load_bot_tuning(path: &str) -> BotTuning {
    load_bot_tuning_from_file(path).unwrap_or_else(|err| {
        warn!("{}, using default bot tuning", err);
        BotTuning::default()
    })
}
