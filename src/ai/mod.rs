//! AI module - bot navigation, path search and decision making

mod capabilities;
mod decision;
mod errors;
mod grid;
mod humanize;
mod navigation;
mod pathfinding;
mod profiles;
mod stuck;

pub use capabilities::*;
pub use decision::*;
pub use errors::*;
pub use grid::*;
pub use humanize::*;
pub use navigation::*;
pub use pathfinding::*;
pub use profiles::*;
pub use stuck::*;

use std::sync::Arc;

use bevy::prelude::*;

use crate::levels::PlatformRegistry;
use crate::player::{Bot, BodyState, DesiredVelocity, VelocityActuator, actuate_bots};
use crate::tuning::BotTuning;

/// Discrete output of one decision tick
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementIntent {
    pub move_left: bool,
    pub move_right: bool,
    pub jump: bool,
}

impl MovementIntent {
    pub const IDLE: Self = Self {
        move_left: false,
        move_right: false,
        jump: false,
    };

    /// Intent from a horizontal direction (sign only) and a jump flag
    pub fn from_direction(direction: f32, jump: bool) -> Self {
        Self {
            move_left: direction < 0.0,
            move_right: direction > 0.0,
            jump,
        }
    }

    /// -1.0 (left), 0.0 or 1.0 (right)
    pub fn horizontal(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Per-bot behavior choice, applied to the controller when it changes
#[derive(Component, Clone, Debug, Default)]
pub struct BotBehavior(pub BehaviorPolicy);

/// Everything a bot entity needs besides its `ChaseTarget`
#[derive(Bundle, Default)]
pub struct BotBundle {
    pub bot: Bot,
    pub body: BodyState,
    pub intent: MovementIntent,
    pub actuator: VelocityActuator,
    pub desired_velocity: DesiredVelocity,
    pub behavior: BotBehavior,
    pub relation: TargetRelation,
}

/// Wires the navigation core into an app.
/// Insert `PlatformRegistry` and `BotTuning` before adding to override defaults.
pub struct BotNavPlugin;

impl Plugin for BotNavPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlatformRegistry>()
            .init_resource::<BotTuning>()
            .init_resource::<BotController>()
            .add_systems(
                Update,
                (
                    sync_bot_behavior,
                    sync_target_relation,
                    rebuild_nav_graph,
                    bot_decision_update,
                    actuate_bots,
                    forget_despawned_bots,
                )
                    .chain(),
            );
    }
}

/// Rebuild the graph when the registry's platform set or the tuning changes
pub fn rebuild_nav_graph(
    registry: Res<PlatformRegistry>,
    tuning: Res<BotTuning>,
    mut controller: ResMut<BotController>,
) {
    let freshness = controller.graph().check_fresh(&registry);
    if freshness.is_ok() && !tuning.is_changed() {
        return;
    }

    if let Err(stale) = freshness {
        // Revision 0 is the empty startup graph
        if controller.graph().built_for_revision > 0 {
            warn!("{}, rebuilding", stale);
            controller.report_fault(stale);
        }
    }
    if tuning.is_changed() {
        controller.tuning = tuning.clone();
    }
    let graph = NavGraph::build_from_registry(&registry, tuning.jump_profile());
    controller.set_graph(Arc::new(graph));
}

/// Push changed `BotBehavior` components into the controller
pub fn sync_bot_behavior(
    mut controller: ResMut<BotController>,
    behaviors: Query<(Entity, &BotBehavior), Changed<BotBehavior>>,
) {
    for (entity, behavior) in &behaviors {
        controller.set_behavior(BotId::from(entity), behavior.0.clone());
    }
}

/// Push changed `TargetRelation` components into the controller
pub fn sync_target_relation(
    mut controller: ResMut<BotController>,
    relations: Query<(Entity, &TargetRelation), Changed<TargetRelation>>,
) {
    for (entity, relation) in &relations {
        controller.set_relation(BotId::from(entity), *relation);
    }
}

/// Drop navigation state for bots that were despawned
pub fn forget_despawned_bots(
    mut removed: RemovedComponents<Bot>,
    mut controller: ResMut<BotController>,
) {
    for entity in removed.read() {
        if controller.forget(BotId::from(entity)) {
            debug!("Forgot navigation state for {:?}", entity);
        }
    }
}
