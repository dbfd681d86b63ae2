//! Bot capabilities - jump profile and reachability queries.
//!
//! Single source of truth for "can the bot get from here to there".
//! The graph builder and the direct-jump check in the decision policy
//! both go through `JumpProfile`, so the two never disagree.

use bevy::prelude::*;

use crate::constants::*;

/// Horizontal and vertical traversal bounds for a bot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpProfile {
    /// Largest gap between platform edges a jump can cross
    pub max_reach: f32,
    /// Largest rise (exclusive) between platform tops
    pub max_height: f32,
    /// Bound on fall depth for fall edges (None = any depth)
    pub max_fall: Option<f32>,
    /// Rise beyond which a move counts as a jump rather than a walk
    pub jump_margin: f32,
}

impl Default for JumpProfile {
    fn default() -> Self {
        Self {
            max_reach: JUMP_REACH,
            max_height: JUMP_HEIGHT,
            max_fall: None,
            jump_margin: JUMP_MARGIN,
        }
    }
}

impl JumpProfile {
    pub fn new(max_reach: f32, max_height: f32) -> Self {
        Self {
            max_reach,
            max_height,
            max_fall: None,
            jump_margin: JUMP_MARGIN,
        }
    }

    pub fn with_max_fall(mut self, max_fall: Option<f32>) -> Self {
        self.max_fall = max_fall;
        self
    }

    pub fn with_jump_margin(mut self, jump_margin: f32) -> Self {
        self.jump_margin = jump_margin;
        self
    }

    /// Can the bot clear a horizontal gap between edges?
    pub fn can_span(&self, gap: f32) -> bool {
        gap.abs() <= self.max_reach
    }

    /// Is a vertical delta (to.top - from.top, negative = higher) inside the
    /// open band (-max_height, max_height)?
    pub fn within_vertical_band(&self, vertical_delta: f32) -> bool {
        vertical_delta > -self.max_height && vertical_delta < self.max_height
    }

    /// Can the bot fall `depth` units (depth > 0) without a jump?
    pub fn can_fall(&self, depth: f32) -> bool {
        depth > 0.0 && self.max_fall.is_none_or(|max| depth <= max)
    }

    /// Direct (graph-free) jump check from a standing position to a target point.
    /// The target must be higher than `from` by more than the jump margin,
    /// below the jump height, and within horizontal reach.
    pub fn can_jump_to(&self, from: Vec2, to: Vec2) -> bool {
        let rise = from.y - to.y; // Screen space: smaller y is higher
        rise > self.jump_margin && rise < self.max_height && (to.x - from.x).abs() <= self.max_reach
    }
}

/// Find the x position to stand at so a jump clears an overhanging platform.
/// Returns the nearer of the two points `clearance` beyond the span's edges.
pub fn find_escape_x(x: f32, left_x: f32, right_x: f32, clearance: f32) -> f32 {
    let left_escape = left_x - clearance;
    let right_escape = right_x + clearance;
    if (x - left_escape).abs() <= (x - right_escape).abs() {
        left_escape
    } else {
        right_escape
    }
}
