//! Body and bot components

use bevy::prelude::*;

/// Snapshot of a physics body as the navigation core sees it.
/// `position` is the feet (bottom center) in screen space, +y down.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
}

impl BodyState {
    /// Grounded body at rest
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            grounded: true,
        }
    }

    pub fn airborne(mut self, velocity: Vec2) -> Self {
        self.grounded = false;
        self.velocity = velocity;
        self
    }
}

/// Marker for bot-controlled bodies
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Bot;

/// Body this bot is chasing
#[derive(Component, Clone, Copy, Debug)]
pub struct ChaseTarget(pub Entity);

/// Velocity the actuator wants the physics layer to apply this tick
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct DesiredVelocity(pub Vec2);
