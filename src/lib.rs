//! Tagbot - platformer bot navigation built with Bevy
//!
//! Turns a static platform layout into a navigation graph and drives bots
//! that chase (or run from) a moving target across it. Each tick the bot's decision
//! policy emits a `MovementIntent` (left/right/jump) that an actuator turns
//! into a desired velocity for the host physics.

// Core modules
pub mod config_watcher;
pub mod constants;
pub mod helpers;
pub mod testing;
pub mod tuning;

// Navigation modules
pub mod ai;
pub mod levels;
pub mod player;

// Re-export commonly used types for convenience
pub use ai::{
    BOT_PROFILES_FILE, BehaviorPolicy, BotBehavior, BotBundle, BotController, BotId, BotMode,
    BotNavPlugin, BotProfileDatabase, EdgeType, HumanizeProfile, JumpProfile, MovementIntent,
    NavEdge, NavError, NavGraph, NavNode, NodeId, OutputScale, PathResult, StuckDetector,
    StuckStatus, TargetRelation, WalkGrid, find_flee_path, find_path, find_path_fewest_hops,
};
pub use config_watcher::{ConfigWatchPlugin, ConfigWatcher};
pub use constants::*;
pub use helpers::*;
pub use levels::{LevelData, LevelDatabase, Platform, PlatformRegistry};
pub use player::{Bot, BodyState, ChaseTarget, DesiredVelocity, VelocityActuator};
pub use tuning::{BOT_TUNING_FILE, BotTuning};
