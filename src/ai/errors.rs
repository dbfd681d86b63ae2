//! Navigation faults. None of these are fatal: the decision policy recovers
//! from each one locally and records the latest in the bot's state.

use bevy::prelude::*;

use crate::ai::navigation::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub enum NavError {
    /// Target node is not reachable from the bot's node
    NoPathFound { from: NodeId, to: NodeId },
    /// Body is not resting on any known platform
    LocalizationMiss { position: Vec2 },
    /// Platform set changed since the graph was built
    StaleGraph { built_for: u64, current: u64 },
}

impl std::fmt::Display for NavError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavError::NoPathFound { from, to } => {
                write!(f, "no path from node {} to node {}", from, to)
            }
            NavError::LocalizationMiss { position } => {
                write!(f, "no platform under ({:.0}, {:.0})", position.x, position.y)
            }
            NavError::StaleGraph { built_for, current } => write!(
                f,
                "nav graph built for platform revision {} but registry is at {}",
                built_for, current
            ),
        }
    }
}

impl std::error::Error for NavError {}
