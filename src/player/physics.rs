//! Reference actuator: movement intent to desired velocity.
//!
//! Mirrors how the game applied input. Horizontal speed blends toward the
//! target speed, and a jump fires on a fresh press from a settled, grounded
//! body. It returns velocities and never touches the physics engine.

use bevy::prelude::*;

use crate::ai::{BotController, BotId, MovementIntent, OutputScale};
use crate::helpers::blend_toward;
use crate::player::{Bot, BodyState, DesiredVelocity};
use crate::tuning::BotTuning;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct VelocityActuator {
    /// A jump fired during the current press; a new jump needs a release first
    jump_latched: bool,
}

impl VelocityActuator {
    /// Desired velocity for this tick
    pub fn apply(
        &mut self,
        body: &BodyState,
        intent: MovementIntent,
        tuning: &BotTuning,
        scale: OutputScale,
    ) -> Vec2 {
        let direction = intent.horizontal();
        let target_vx = direction * tuning.move_speed * scale.speed;

        // Accelerate while a direction is held, coast down otherwise
        let factor = if direction != 0.0 {
            tuning.acceleration_factor
        } else {
            tuning.deceleration_factor
        };
        let vx = blend_toward(body.velocity.x, target_vx, factor);

        let mut vy = body.velocity.y;
        if intent.jump {
            if !self.jump_latched && body.grounded && tuning.is_settled(body.velocity.y) {
                vy = -tuning.jump_strength * scale.jump; // Screen space: up is negative
                self.jump_latched = true;
            }
        } else {
            self.jump_latched = false;
        }

        Vec2::new(vx, vy)
    }
}

/// Turn each bot's intent into a desired velocity for the physics layer.
/// Runs in Update after the decision tick.
pub fn actuate_bots(
    tuning: Res<BotTuning>,
    controller: Res<BotController>,
    mut bots: Query<
        (
            Entity,
            &BodyState,
            &MovementIntent,
            &mut VelocityActuator,
            &mut DesiredVelocity,
        ),
        With<Bot>,
    >,
) {
    for (entity, body, intent, mut actuator, mut desired) in &mut bots {
        let scale = controller.output_scale(BotId::from(entity));
        desired.0 = actuator.apply(body, *intent, &tuning, scale);
    }
}
