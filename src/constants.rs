//! Tunable constants for tagbot
//!
//! Default values for bot navigation. Runtime values live in `BotTuning`
//! and are seeded from these.

// =============================================================================
// FILE PATHS
// =============================================================================

pub const LEVELS_FILE: &str = "assets/levels.txt";

// =============================================================================
// MOVEMENT (passed through to the actuator)
// =============================================================================

pub const MOVE_SPEED: f32 = 5.5;
pub const JUMP_STRENGTH: f32 = 15.0;
pub const ACCELERATION_FACTOR: f32 = 0.1; // Velocity blend per tick while a direction is held
pub const DECELERATION_FACTOR: f32 = 0.15; // Velocity blend per tick with no direction held
pub const JUMP_VELOCITY_THRESHOLD: f32 = 0.5; // |vy| below this counts as settled

// =============================================================================
// JUMP PROFILE
// =============================================================================

pub const JUMP_REACH: f32 = 250.0; // Max horizontal gap between platform edges
pub const JUMP_HEIGHT: f32 = 220.0; // Max rise between platform tops

// =============================================================================
// STUCK DETECTION
// =============================================================================

pub const STUCK_DISTANCE_THRESHOLD: f32 = 1.0;
pub const STUCK_TIME_THRESHOLD_MS: f32 = 500.0;
pub const STUCK_COOLDOWN_MS: f32 = 500.0;

// =============================================================================
// DECISION POLICY
// =============================================================================

pub const RECOMPUTE_INTERVAL_MS: f32 = 500.0;
pub const HORIZONTAL_DEAD_ZONE: f32 = 2.0; // Avoids left/right jitter around the steer point
pub const JUMP_MARGIN: f32 = 20.0; // Sub-goal must be this much higher before jumping
pub const EDGE_MARGIN: f32 = 20.0; // Inset from platform edges when picking a steer point
pub const EDGE_JUMP_MARGIN: f32 = 30.0; // Distance from edge at which gap hops fire
pub const CEILING_CLEARANCE: f32 = 40.0; // Distance past an overhang before jumping up to it

// =============================================================================
// LOCALIZATION
// =============================================================================

pub const STANDING_TOLERANCE: f32 = 10.0; // Max height above a top edge and still "on" it
pub const LATERAL_TOLERANCE: f32 = 20.0; // Span widening for bodies hanging over an edge
pub const PENETRATION_ALLOWANCE: f32 = 10.0; // Bodies may sink this far below a top edge

// =============================================================================
// GRID SEARCH
// =============================================================================

pub const GRID_CELL_SIZE: f32 = 50.0;
pub const GRID_MAX_CELLS_PER_AXIS: i32 = 2048; // Caps the matrix for oversized worlds

// =============================================================================
// WORLD
// =============================================================================

pub const WORLD_WIDTH: f32 = 3200.0;
pub const WORLD_HEIGHT: f32 = 2400.0;
