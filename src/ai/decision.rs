//! Bot decision policy - turns bot and target bodies into a MovementIntent
//!
//! Each tick: localize both bodies, run the stuck detector, then either chase
//! the target directly (same platform, or no route) or steer toward the next
//! node of an A* path. Paths are reused until the target changes platform,
//! the bot leaves the path, or the recompute interval runs out.
//!
//! An evading bot runs the same loop with the direction flipped: it heads
//! for the reachable node farthest from its pursuer and otherwise runs
//! straight away from it.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::ai::capabilities::find_escape_x;
use crate::ai::errors::NavError;
use crate::ai::humanize::{BehaviorPolicy, FilterContext, Humanizer, OutputScale};
use crate::ai::navigation::{NavGraph, NavNode, NodeId};
use crate::ai::pathfinding::{find_flee_path, find_path};
use crate::ai::stuck::StuckStatus;
use crate::ai::MovementIntent;
use crate::helpers::{distance_to_span, sign_with_dead_zone};
use crate::player::{Bot, BodyState, ChaseTarget};
use crate::tuning::BotTuning;

/// Key for a bot's navigation state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BotId(pub u64);

impl From<Entity> for BotId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// Whether a bot runs toward its target or away from it
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetRelation {
    #[default]
    Chase,
    Evade,
}

/// What the policy is doing for a bot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BotMode {
    /// No path: chasing directly or standing with the target
    #[default]
    Idle,
    /// Walking/jumping along `current_path` (toward the target, or away from it)
    FollowingPath,
    /// Stuck detector fired; lasts until progress is seen again
    StuckRecovery,
}

/// Per-bot navigation memory, owned by the controller
#[derive(Clone, Debug, Default)]
pub struct AgentNavState {
    /// Remaining nodes to visit (excludes the node the bot is on)
    pub current_path: Vec<NodeId>,
    /// Node the current path starts from
    pub path_origin: Option<NodeId>,
    /// Target node the current path was planned for (the pursuer's node when evading)
    pub path_target_node: Option<NodeId>,
    pub relation: TargetRelation,
    pub last_known_position: Option<Vec2>,
    pub stuck_accumulated_ms: f32,
    pub last_progress_ms: f32,
    pub cooldown_until_ms: f32,
    /// Sum of all tick durations seen by this bot
    pub clock_ms: f32,
    pub last_replan_ms: Option<f32>,
    pub mode: BotMode,
    /// Horizontal direction of the last deterministic intent (-1, 0, 1)
    pub last_horizontal: f32,
    /// Recovery jump waiting for the body to be grounded and settled
    pub recovery_jump_pending: bool,
    /// Set on the tick the recovery jump goes out
    pub recovery_jump_fired: bool,
    pub last_fault: Option<NavError>,
    pub humanizer: Option<Humanizer>,
}

impl AgentNavState {
    /// Next node to reach, if following a path
    pub fn sub_goal(&self) -> Option<NodeId> {
        self.current_path.first().copied()
    }

    /// Drop the current path. Replan throttling is kept.
    pub fn clear_path(&mut self) {
        self.current_path.clear();
        self.path_origin = None;
        self.path_target_node = None;
    }

    /// Change mode, except that recovery only ends on progress
    fn set_mode(&mut self, mode: BotMode) {
        if self.mode != BotMode::StuckRecovery {
            self.mode = mode;
        }
    }
}

/// Decision policy for every bot, sharing one navigation graph
#[derive(Resource)]
pub struct BotController {
    graph: Arc<NavGraph>,
    pub tuning: BotTuning,
    agents: HashMap<BotId, AgentNavState>,
}

impl Default for BotController {
    fn default() -> Self {
        Self::new(Arc::new(NavGraph::default()), BotTuning::default())
    }
}

impl BotController {
    pub fn new(graph: Arc<NavGraph>, tuning: BotTuning) -> Self {
        Self {
            graph,
            tuning,
            agents: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &Arc<NavGraph> {
        &self.graph
    }

    /// Swap in a graph for a new platform set. Node ids from the old graph
    /// mean nothing in the new one, so every bot's path is dropped.
    pub fn set_graph(&mut self, graph: Arc<NavGraph>) {
        self.graph = graph;
        for state in self.agents.values_mut() {
            state.clear_path();
            state.last_replan_ms = None;
            state.set_mode(BotMode::Idle);
        }
    }

    pub fn state(&self, bot: BotId) -> Option<&AgentNavState> {
        self.agents.get(&bot)
    }

    /// Remove a bot's state. Returns whether it was known.
    pub fn forget(&mut self, bot: BotId) -> bool {
        self.agents.remove(&bot).is_some()
    }

    pub fn bot_count(&self) -> usize {
        self.agents.len()
    }

    /// Choose deterministic or humanized output for a bot.
    /// Humanized bots are seeded from their id.
    pub fn set_behavior(&mut self, bot: BotId, policy: BehaviorPolicy) {
        let state = self.agents.entry(bot).or_default();
        state.humanizer = match policy {
            BehaviorPolicy::Deterministic => None,
            BehaviorPolicy::Humanized(profile) => Some(Humanizer::new(profile, bot.0)),
        };
    }

    /// The bot's role changed; humanized bots pause briefly
    pub fn notify_role_swap(&mut self, bot: BotId) {
        if let Some(state) = self.agents.get_mut(&bot) {
            let now = state.clock_ms;
            if let Some(humanizer) = state.humanizer.as_mut() {
                humanizer.pause_for_role_swap(now);
            }
        }
    }

    /// Switch between chasing and evading. A change drops the current path
    /// and counts as a role swap.
    pub fn set_relation(&mut self, bot: BotId, relation: TargetRelation) {
        let state = self.agents.entry(bot).or_default();
        if state.relation == relation {
            return;
        }
        debug!("Bot {:?} now {:?}", bot, relation);
        state.relation = relation;
        state.clear_path();
        state.last_replan_ms = None;
        self.notify_role_swap(bot);
    }

    /// Speed and jump multipliers for the actuator (unit unless humanized)
    pub fn output_scale(&self, bot: BotId) -> OutputScale {
        self.agents
            .get(&bot)
            .and_then(|s| s.humanizer.as_ref())
            .map_or(OutputScale::UNIT, |h| h.output_scale())
    }

    /// Record a fault against every bot
    pub fn report_fault(&mut self, fault: NavError) {
        for state in self.agents.values_mut() {
            state.last_fault = Some(fault.clone());
        }
    }

    /// Run one decision tick for a bot chasing or evading `target`
    pub fn tick(
        &mut self,
        bot_id: BotId,
        bot: &BodyState,
        target: &BodyState,
        dt_ms: f32,
    ) -> MovementIntent {
        let dt_ms = dt_ms.max(0.0);
        let state = self.agents.entry(bot_id).or_default();
        state.clock_ms += dt_ms;

        let intent = decide(&self.graph, &self.tuning, state, bot, target, dt_ms);
        state.last_horizontal = intent.horizontal();

        let context = FilterContext {
            now_ms: state.clock_ms,
            can_hop: state.relation == TargetRelation::Evade
                && bot.grounded
                && self.tuning.is_settled(bot.velocity.y),
            // The one recovery jump is never hesitated away or skipped
            forced_jump: state.recovery_jump_fired && intent.jump,
        };
        match state.humanizer.as_mut() {
            Some(humanizer) => humanizer.filter_with(intent, context),
            None => intent,
        }
    }
}

fn decide(
    graph: &NavGraph,
    tuning: &BotTuning,
    state: &mut AgentNavState,
    bot: &BodyState,
    target: &BodyState,
    dt_ms: f32,
) -> MovementIntent {
    let tolerance = tuning.locate_tolerance();
    let bot_node = graph.locate(bot.position, &tolerance);
    // An airborne target counts as being on whatever it will land on
    let target_node = graph
        .locate(target.position, &tolerance)
        .or_else(|| graph.locate_support(target.position, tolerance.lateral));
    let settled = bot.grounded && tuning.is_settled(bot.velocity.y);

    // Standing next to the target is not being stuck; an evading bot always wants to move
    let dx = target.position.x - bot.position.x;
    let evading = state.relation == TargetRelation::Evade;
    let wants_to_move = evading
        || bot_node.is_none()
        || bot_node != target_node
        || dx.abs() > tuning.horizontal_dead_zone;
    let detector = tuning.stuck_detector();
    let status = if wants_to_move {
        detector.update(state, bot.position, dt_ms)
    } else {
        detector.rest(state, bot.position);
        StuckStatus::Progressing
    };

    match status {
        StuckStatus::Stuck => {
            debug!(
                "Bot stuck at ({:.0}, {:.0}), clearing path",
                bot.position.x, bot.position.y
            );
            state.clear_path();
            state.mode = BotMode::StuckRecovery;
            state.recovery_jump_pending = true;
        }
        StuckStatus::Progressing if state.mode == BotMode::StuckRecovery => {
            state.mode = BotMode::Idle;
            state.recovery_jump_pending = false;
        }
        _ => {}
    }

    state.recovery_jump_fired = false;
    if state.recovery_jump_pending {
        if settled {
            state.recovery_jump_pending = false;
            state.recovery_jump_fired = true;
        }
        return MovementIntent::from_direction(state.last_horizontal, settled);
    }

    let Some(bot_node) = bot_node else {
        if !bot.grounded {
            return airborne_intent(graph, tuning, state, bot);
        }
        debug!(
            "Bot grounded off the graph at ({:.0}, {:.0})",
            bot.position.x, bot.position.y
        );
        state.last_fault = Some(NavError::LocalizationMiss {
            position: bot.position,
        });
        state.set_mode(BotMode::Idle);
        return direct_move(tuning, state, bot, target, settled);
    };

    if evading {
        return flee(graph, tuning, state, bot, bot_node, target_node, target, settled);
    }

    // Same platform as the target, or target off the graph
    let Some(target_node) = target_node.filter(|&t| t != bot_node) else {
        state.clear_path();
        state.set_mode(BotMode::Idle);
        return direct_chase(tuning, bot, target, settled);
    };

    advance_along_path(state, bot_node);
    if needs_replan(state, tuning, bot_node, Some(target_node)) {
        replan(graph, state, bot_node, target_node);
    }

    let next = state.sub_goal().and_then(|id| graph.node(id));
    let (Some(current), Some(next)) = (graph.node(bot_node), next) else {
        state.set_mode(BotMode::Idle);
        return direct_chase(tuning, bot, target, settled);
    };

    state.set_mode(BotMode::FollowingPath);
    steer_to_sub_goal(tuning, bot, current, next, settled)
}

/// Evade: follow a route to the node farthest from the pursuer, or run
/// straight away from it once there is nowhere farther to go
#[allow(clippy::too_many_arguments)]
fn flee(
    graph: &NavGraph,
    tuning: &BotTuning,
    state: &mut AgentNavState,
    bot: &BodyState,
    bot_node: NodeId,
    threat_node: Option<NodeId>,
    threat: &BodyState,
    settled: bool,
) -> MovementIntent {
    advance_along_path(state, bot_node);
    if needs_replan(state, tuning, bot_node, threat_node) {
        state.current_path = find_flee_path(graph, bot_node, threat.position);
        state.path_origin = Some(bot_node);
        state.path_target_node = threat_node;
        state.last_replan_ms = Some(state.clock_ms);
        debug!("Flee path from node {}: {:?}", bot_node, state.current_path);
    }

    let next = state.sub_goal().and_then(|id| graph.node(id));
    let (Some(current), Some(next)) = (graph.node(bot_node), next) else {
        state.set_mode(BotMode::Idle);
        return direct_move(tuning, state, bot, threat, settled);
    };

    state.set_mode(BotMode::FollowingPath);
    steer_to_sub_goal(tuning, bot, current, next, settled)
}

/// Direct steering with no path: toward the target, or away when evading
fn direct_move(
    tuning: &BotTuning,
    state: &AgentNavState,
    bot: &BodyState,
    target: &BodyState,
    settled: bool,
) -> MovementIntent {
    match state.relation {
        TargetRelation::Chase => direct_chase(tuning, bot, target, settled),
        TargetRelation::Evade => direct_flee(tuning, state, bot, target),
    }
}

/// Run away from the pursuer's x. Directly on top of it, keep going the
/// same way (or right when there is no way yet).
fn direct_flee(
    tuning: &BotTuning,
    state: &AgentNavState,
    bot: &BodyState,
    threat: &BodyState,
) -> MovementIntent {
    let away = -sign_with_dead_zone(
        threat.position.x - bot.position.x,
        tuning.horizontal_dead_zone,
    );
    let direction = if away != 0.0 {
        away
    } else if state.last_horizontal != 0.0 {
        state.last_horizontal
    } else {
        1.0
    };
    MovementIntent::from_direction(direction, false)
}

/// Chase the target's x; jump if it is above and within reach
fn direct_chase(
    tuning: &BotTuning,
    bot: &BodyState,
    target: &BodyState,
    settled: bool,
) -> MovementIntent {
    let direction = sign_with_dead_zone(
        target.position.x - bot.position.x,
        tuning.horizontal_dead_zone,
    );
    let jump = settled && tuning.jump_profile().can_jump_to(bot.position, target.position);
    MovementIntent::from_direction(direction, jump)
}

/// Mid-air: keep heading for the sub-goal, or keep the last direction
fn airborne_intent(
    graph: &NavGraph,
    tuning: &BotTuning,
    state: &AgentNavState,
    bot: &BodyState,
) -> MovementIntent {
    let direction = match state.sub_goal().and_then(|id| graph.node(id)) {
        Some(next) => sign_with_dead_zone(
            next.approach_x(bot.position.x, tuning.edge_margin) - bot.position.x,
            tuning.horizontal_dead_zone,
        ),
        None => state.last_horizontal,
    };
    MovementIntent::from_direction(direction, false)
}

/// Pop path nodes up to and including the one the bot stands on
fn advance_along_path(state: &mut AgentNavState, bot_node: NodeId) {
    if let Some(reached) = state.current_path.iter().position(|&n| n == bot_node) {
        state.current_path.drain(..=reached);
        state.path_origin = Some(bot_node);
    }
}

fn needs_replan(
    state: &AgentNavState,
    tuning: &BotTuning,
    bot_node: NodeId,
    target_node: Option<NodeId>,
) -> bool {
    if state.path_target_node != target_node || state.path_origin != Some(bot_node) {
        return true;
    }
    match state.last_replan_ms {
        Some(at) => state.clock_ms - at >= tuning.recompute_interval_ms,
        None => true,
    }
}

fn replan(graph: &NavGraph, state: &mut AgentNavState, from: NodeId, to: NodeId) {
    state.current_path = find_path(graph, from, to);
    state.path_origin = Some(from);
    state.path_target_node = Some(to);
    state.last_replan_ms = Some(state.clock_ms);

    if state.current_path.is_empty() {
        debug!("No path from node {} to node {}", from, to);
        state.last_fault = Some(NavError::NoPathFound { from, to });
    } else {
        debug!("Path {} -> {}: {:?}", from, to, state.current_path);
    }
}

/// Steering and jumping toward the next node of the path
fn steer_to_sub_goal(
    tuning: &BotTuning,
    bot: &BodyState,
    current: &NavNode,
    next: &NavNode,
    settled: bool,
) -> MovementIntent {
    let x = bot.position.x;
    let dead_zone = tuning.horizontal_dead_zone;
    // Positive = sub-goal is higher
    let rise = current.rise_to(next);

    if rise > tuning.jump_margin {
        // Under the overhang: get out to the side before jumping
        let half_clearance = tuning.ceiling_clearance / 2.0;
        if x > next.left_x - half_clearance && x < next.right_x + half_clearance {
            let escape_x = find_escape_x(x, next.left_x, next.right_x, tuning.ceiling_clearance)
                .clamp(current.left_x, current.right_x);
            return MovementIntent::from_direction(sign_with_dead_zone(escape_x - x, dead_zone), false);
        }

        let steer_x = next.approach_x(x, tuning.edge_margin);
        let in_reach = distance_to_span(x, next.left_x, next.right_x) <= tuning.jump_reach;
        return MovementIntent::from_direction(
            sign_with_dead_zone(steer_x - x, dead_zone),
            settled && in_reach,
        );
    }

    if rise < 0.0 && next.overlaps_x(current) {
        // Lower platform underneath: walk off an edge that lands on it
        let exit_x = drop_exit_x(x, current, next, tuning.edge_margin + tuning.lateral_tolerance);
        return MovementIntent::from_direction(sign_with_dead_zone(exit_x - x, dead_zone), false);
    }

    let steer_x = next.approach_x(x, tuning.edge_margin);
    let direction = sign_with_dead_zone(steer_x - x, dead_zone);

    // Gap to cross: hop from the edge facing the sub-goal
    let facing_edge = if next.anchor.x > current.anchor.x {
        current.right_x
    } else {
        current.left_x
    };
    let hop = current.horizontal_gap(next) > 0.0
        && direction != 0.0
        && (x - facing_edge).abs() <= tuning.edge_jump_margin;

    MovementIntent::from_direction(direction, settled && hop)
}

/// X just past the current platform's edge, preferring edges that land on `next`
fn drop_exit_x(x: f32, current: &NavNode, next: &NavNode, overshoot: f32) -> f32 {
    let left_exit = current.left_x - overshoot;
    let right_exit = current.right_x + overshoot;
    let nearer = if (x - left_exit).abs() <= (right_exit - x).abs() {
        left_exit
    } else {
        right_exit
    };
    match (next.contains_x(left_exit, 0.0), next.contains_x(right_exit, 0.0)) {
        (true, false) => left_exit,
        (false, true) => right_exit,
        _ => nearer,
    }
}

/// Run one decision tick for every bot and store its intent.
/// Runs in Update after the graph rebuild.
pub fn bot_decision_update(
    time: Res<Time>,
    mut controller: ResMut<BotController>,
    mut bots: Query<(Entity, &BodyState, &ChaseTarget, &mut MovementIntent), With<Bot>>,
    bodies: Query<&BodyState>,
) {
    let dt_ms = time.delta_secs() * 1000.0;

    for (entity, body, chase, mut intent) in &mut bots {
        let Ok(target) = bodies.get(chase.0) else {
            *intent = MovementIntent::IDLE;
            continue;
        };
        *intent = controller.tick(BotId::from(entity), body, target, dt_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::capabilities::JumpProfile;
    use crate::ai::profiles::HumanizeProfile;
    use crate::levels::{LevelDatabase, Platform, PlatformRegistry};

    const TICK_MS: f32 = 100.0;

    fn platform(id: &str, left: f32, right: f32, top: f32) -> Platform {
        Platform::new(
            id,
            Vec2::new((left + right) / 2.0, top + 10.0),
            right - left,
            20.0,
        )
    }

    fn controller(platforms: &[Platform], tuning: BotTuning) -> BotController {
        let graph = NavGraph::build(platforms, tuning.jump_profile());
        BotController::new(Arc::new(graph), tuning)
    }

    fn short_reach() -> BotTuning {
        BotTuning {
            jump_reach: 150.0,
            ..default()
        }
    }

    /// A, C, B side by side at the same height; A and B too far apart to hop
    fn row_of_three() -> Vec<Platform> {
        vec![
            platform("platform-a", 0.0, 200.0, 1000.0),
            platform("platform-b", 400.0, 600.0, 1000.0),
            platform("platform-c", 200.0, 400.0, 1000.0),
        ]
    }

    #[test]
    fn test_walks_toward_level_sub_goal() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(500.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        let state = ctrl.state(BotId(1)).unwrap();
        // Path excludes the start: C then B
        assert_eq!(state.current_path, vec![2, 1]);
        assert_eq!(state.mode, BotMode::FollowingPath);
        assert!(intent.move_right && !intent.move_left);
        assert!(!intent.jump);
    }

    #[test]
    fn test_pinned_bot_jumps_exactly_once() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(300.0, 1000.0));

        let jumps: Vec<bool> = (0..7)
            .map(|_| ctrl.tick(BotId(1), &bot, &target, TICK_MS).jump)
            .collect();
        assert_eq!(jumps.iter().filter(|&&j| j).count(), 1);
        assert!(jumps[5]);
    }

    #[test]
    fn test_recovery_clears_path() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(300.0, 1000.0));

        for _ in 0..5 {
            ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        }
        assert!(!ctrl.state(BotId(1)).unwrap().current_path.is_empty());

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        let state = ctrl.state(BotId(1)).unwrap();
        assert!(intent.jump);
        // Keeps heading the way it was going
        assert!(intent.move_right);
        assert!(state.current_path.is_empty());
        assert_eq!(state.mode, BotMode::StuckRecovery);

        // Moving again ends recovery
        let moved = BodyState::new(Vec2::new(130.0, 1000.0));
        ctrl.tick(BotId(1), &moved, &target, TICK_MS);
        assert_eq!(ctrl.state(BotId(1)).unwrap().mode, BotMode::FollowingPath);
    }

    #[test]
    fn test_recovery_jump_waits_for_ground() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        // Wedged in the air, not moving
        let wedged = BodyState::new(Vec2::new(100.0, 900.0)).airborne(Vec2::ZERO);
        let target = BodyState::new(Vec2::new(500.0, 1000.0));

        for _ in 0..6 {
            assert!(!ctrl.tick(BotId(1), &wedged, &target, TICK_MS).jump);
        }
        assert!(ctrl.state(BotId(1)).unwrap().recovery_jump_pending);

        let landed = BodyState {
            grounded: true,
            ..wedged
        };
        assert!(ctrl.tick(BotId(1), &landed, &target, TICK_MS).jump);
        assert!(!ctrl.state(BotId(1)).unwrap().recovery_jump_pending);
    }

    #[test]
    fn test_direct_jump_without_path() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bot = BodyState::new(Vec2::new(0.0, 1000.0));
        // Target mid-air 100 up and 50 across
        let target = BodyState::new(Vec2::new(50.0, 900.0)).airborne(Vec2::new(0.0, -3.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        assert!(intent.jump);
        assert!(intent.move_right);
        assert!(ctrl.state(BotId(1)).unwrap().current_path.is_empty());
    }

    #[test]
    fn test_no_jump_when_unsettled() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bouncing = BodyState {
            velocity: Vec2::new(0.0, 2.0),
            ..BodyState::new(Vec2::new(0.0, 1000.0))
        };
        let target = BodyState::new(Vec2::new(50.0, 900.0)).airborne(Vec2::ZERO);
        assert!(!ctrl.tick(BotId(1), &bouncing, &target, TICK_MS).jump);
    }

    #[test]
    fn test_no_path_falls_back_to_direct_chase() {
        let platforms = vec![
            platform("platform-a", 0.0, 200.0, 1000.0),
            platform("platform-far", 1000.0, 1200.0, 1000.0),
        ];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(1100.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        let state = ctrl.state(BotId(1)).unwrap();
        assert!(intent.move_right);
        assert_eq!(state.mode, BotMode::Idle);
        assert_eq!(state.last_fault, Some(NavError::NoPathFound { from: 0, to: 1 }));
    }

    #[test]
    fn test_airborne_keeps_last_direction() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let target = BodyState::new(Vec2::new(-400.0, 1000.0));

        let grounded = BodyState::new(Vec2::new(0.0, 1000.0));
        assert!(ctrl.tick(BotId(1), &grounded, &target, TICK_MS).move_left);

        // In the air, target now behind: no relocalization, same direction
        let flying = BodyState::new(Vec2::new(-10.0, 800.0)).airborne(Vec2::new(-3.0, -5.0));
        let behind = BodyState::new(Vec2::new(400.0, 1000.0));
        let intent = ctrl.tick(BotId(1), &flying, &behind, TICK_MS);
        assert!(intent.move_left);
        assert!(!intent.jump);
    }

    #[test]
    fn test_airborne_steers_to_sub_goal() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let target = BodyState::new(Vec2::new(500.0, 1000.0));
        ctrl.tick(BotId(1), &BodyState::new(Vec2::new(100.0, 1000.0)), &target, TICK_MS);

        // Jumped left of A: the sub-goal C is still to the right
        let flying = BodyState::new(Vec2::new(20.0, 900.0)).airborne(Vec2::new(-2.0, -4.0));
        let intent = ctrl.tick(BotId(1), &flying, &target, TICK_MS);
        assert!(intent.move_right);
    }

    #[test]
    fn test_jumps_up_to_higher_sub_goal() {
        let platforms = vec![
            platform("platform-ground", -1000.0, 1000.0, 1000.0),
            platform("platform-ledge", 300.0, 500.0, 880.0),
        ];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(400.0, 880.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        assert_eq!(ctrl.state(BotId(1)).unwrap().current_path, vec![1]);
        assert!(intent.move_right);
        assert!(intent.jump);
    }

    #[test]
    fn test_escapes_from_under_overhang() {
        let platforms = vec![
            platform("platform-ground", -1000.0, 1000.0, 1000.0),
            platform("platform-ledge", -100.0, 300.0, 880.0),
        ];
        let mut ctrl = controller(&platforms, BotTuning::default());
        // Under the ledge, nearer its right edge
        let bot = BodyState::new(Vec2::new(250.0, 1000.0));
        let target = BodyState::new(Vec2::new(0.0, 880.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        assert!(intent.move_right);
        assert!(!intent.jump);

        // Clear of the ledge: turn back and jump
        let clear = BodyState::new(Vec2::new(340.0, 1000.0));
        let intent = ctrl.tick(BotId(1), &clear, &target, TICK_MS);
        assert!(intent.move_left);
        assert!(intent.jump);
    }

    #[test]
    fn test_walks_off_edge_to_drop_underneath() {
        let platforms = vec![
            platform("platform-ground", -1000.0, 1000.0, 1000.0),
            platform("platform-ledge", -100.0, 300.0, 880.0),
        ];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bot = BodyState::new(Vec2::new(200.0, 880.0));
        let target = BodyState::new(Vec2::new(-800.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        assert_eq!(ctrl.state(BotId(1)).unwrap().current_path, vec![0]);
        // Right edge is nearer even though the target is to the left
        assert!(intent.move_right);
        assert!(!intent.jump);
    }

    #[test]
    fn test_hops_gap_at_edge() {
        let platforms = vec![
            platform("platform-a", 0.0, 200.0, 1000.0),
            platform("platform-b", 300.0, 500.0, 1000.0),
        ];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let target = BodyState::new(Vec2::new(400.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &BodyState::new(Vec2::new(50.0, 1000.0)), &target, TICK_MS);
        assert!(intent.move_right && !intent.jump);

        let intent = ctrl.tick(BotId(1), &BodyState::new(Vec2::new(185.0, 1000.0)), &target, TICK_MS);
        assert!(intent.move_right && intent.jump);
    }

    #[test]
    fn test_stands_still_next_to_target_without_recovering() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let bot = BodyState::new(Vec2::new(0.0, 1000.0));
        let target = BodyState::new(Vec2::new(1.0, 1000.0));

        for _ in 0..20 {
            assert_eq!(ctrl.tick(BotId(1), &bot, &target, TICK_MS), MovementIntent::IDLE);
        }
        assert_eq!(ctrl.state(BotId(1)).unwrap().mode, BotMode::Idle);
    }

    #[test]
    fn test_replans_when_target_changes_node() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(500.0, 1000.0)), 10.0);
        assert_eq!(ctrl.state(BotId(1)).unwrap().path_target_node, Some(1));

        let moved = BodyState::new(Vec2::new(120.0, 1000.0));
        ctrl.tick(BotId(1), &moved, &BodyState::new(Vec2::new(300.0, 1000.0)), 10.0);
        let state = ctrl.state(BotId(1)).unwrap();
        assert_eq!(state.path_target_node, Some(2));
        assert_eq!(state.current_path, vec![2]);
    }

    #[test]
    fn test_set_graph_drops_paths() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(500.0, 1000.0)), TICK_MS);
        assert!(!ctrl.state(BotId(1)).unwrap().current_path.is_empty());

        ctrl.set_graph(Arc::new(NavGraph::build(&row_of_three(), JumpProfile::default())));
        let state = ctrl.state(BotId(1)).unwrap();
        assert!(state.current_path.is_empty());
        assert_eq!(state.mode, BotMode::Idle);
    }

    #[test]
    fn test_humanized_role_swap_pause() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        let calm = HumanizeProfile {
            hesitation_chance: 0.0,
            jump_skip_chance: 0.0,
            ..default()
        };
        ctrl.set_behavior(BotId(1), BehaviorPolicy::Humanized(calm));

        let bot = BodyState::new(Vec2::new(0.0, 1000.0));
        let target = BodyState::new(Vec2::new(300.0, 1000.0));
        assert!(ctrl.tick(BotId(1), &bot, &target, 16.0).move_right);

        ctrl.notify_role_swap(BotId(1));
        assert_eq!(ctrl.tick(BotId(1), &bot, &target, 16.0), MovementIntent::IDLE);
        assert!(ctrl.forget(BotId(1)));
        assert_eq!(ctrl.bot_count(), 0);
    }

    #[test]
    fn test_follows_path_from_angled_platform() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/levels.txt");
        let db = LevelDatabase::load_from_file(path);
        let registry = PlatformRegistry::from_level(db.find("Arena").unwrap());
        let tuning = BotTuning::default();
        let graph = NavGraph::build_from_registry(&registry, tuning.jump_profile());
        let mut ctrl = BotController::new(Arc::new(graph), tuning);

        // Near the high end of the slope, well off the flat top line
        let slope = registry.get("platform-mid-left-angled").unwrap();
        let (sin, cos) = slope.angle.sin_cos();
        let feet = Vec2::new(
            slope.center.x + 72.0 * cos + 10.0 * sin,
            slope.center.y + 72.0 * sin - 10.0 * cos,
        );
        let bot = BodyState::new(feet);
        let target = BodyState::new(Vec2::new(800.0, 790.0));

        ctrl.tick(BotId(1), &bot, &target, TICK_MS);
        let state = ctrl.state(BotId(1)).unwrap();
        assert_eq!(state.last_fault, None);
        assert_eq!(state.mode, BotMode::FollowingPath);
        assert!(!state.current_path.is_empty());
        let top_left = ctrl.graph().node_for_platform("platform-top-left");
        assert_eq!(state.current_path.last().copied(), top_left);
    }

    #[test]
    fn test_recovery_jump_survives_humanizer() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let jittery = HumanizeProfile {
            hesitation_chance: 1.0,
            jump_skip_chance: 1.0,
            ..default()
        };
        ctrl.set_behavior(BotId(1), BehaviorPolicy::Humanized(jittery));
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(300.0, 1000.0));

        let jumps: Vec<bool> = (0..7)
            .map(|_| ctrl.tick(BotId(1), &bot, &target, TICK_MS).jump)
            .collect();
        assert_eq!(jumps.iter().filter(|&&j| j).count(), 1);
        assert!(jumps[5]);
        assert!(!ctrl.state(BotId(1)).unwrap().recovery_jump_pending);
    }

    #[test]
    fn test_evader_runs_away_on_shared_platform() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        ctrl.set_relation(BotId(1), TargetRelation::Evade);
        let bot = BodyState::new(Vec2::new(0.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(100.0, 1000.0)), TICK_MS);
        assert!(intent.move_left && !intent.move_right);
        assert!(!intent.jump);

        let intent = ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(-100.0, 1000.0)), TICK_MS);
        assert!(intent.move_right);

        // Pursuer right on top: keep going the same way
        let intent = ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(0.0, 1000.0)), TICK_MS);
        assert!(intent.move_right);
        assert_eq!(ctrl.state(BotId(1)).unwrap().mode, BotMode::Idle);
    }

    #[test]
    fn test_evader_heads_for_farthest_platform() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        ctrl.set_relation(BotId(1), TargetRelation::Evade);
        let bot = BodyState::new(Vec2::new(300.0, 1000.0));

        // Pursuer on A: flee to B
        let intent = ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(100.0, 1000.0)), TICK_MS);
        let state = ctrl.state(BotId(1)).unwrap();
        assert_eq!(state.current_path, vec![1]);
        assert_eq!(state.path_target_node, Some(0));
        assert_eq!(state.mode, BotMode::FollowingPath);
        assert_eq!(state.last_fault, None);
        assert!(intent.move_right);

        // Pursuer moves to B: flee to A instead
        let intent = ctrl.tick(BotId(1), &bot, &BodyState::new(Vec2::new(500.0, 1000.0)), TICK_MS);
        assert_eq!(ctrl.state(BotId(1)).unwrap().current_path, vec![0]);
        assert!(intent.move_left);
    }

    #[test]
    fn test_relation_change_drops_path_and_pauses() {
        let mut ctrl = controller(&row_of_three(), short_reach());
        let calm = HumanizeProfile {
            hesitation_chance: 0.0,
            jump_skip_chance: 0.0,
            evasive_hop_chance: 0.0,
            ..default()
        };
        ctrl.set_behavior(BotId(1), BehaviorPolicy::Humanized(calm));
        let bot = BodyState::new(Vec2::new(100.0, 1000.0));
        let target = BodyState::new(Vec2::new(500.0, 1000.0));
        assert!(ctrl.tick(BotId(1), &bot, &target, 16.0).move_right);
        assert!(!ctrl.state(BotId(1)).unwrap().current_path.is_empty());

        ctrl.set_relation(BotId(1), TargetRelation::Evade);
        let state = ctrl.state(BotId(1)).unwrap();
        assert!(state.current_path.is_empty());
        assert_eq!(state.relation, TargetRelation::Evade);
        assert_eq!(ctrl.tick(BotId(1), &bot, &target, 16.0), MovementIntent::IDLE);

        // Same relation again is not a swap
        for _ in 0..30 {
            ctrl.tick(BotId(1), &bot, &target, 16.0);
        }
        ctrl.set_relation(BotId(1), TargetRelation::Evade);
        assert!(ctrl.tick(BotId(1), &bot, &target, 16.0).move_left);
    }

    #[test]
    fn test_humanized_evader_hops() {
        let platforms = vec![platform("platform-ground", -500.0, 500.0, 1000.0)];
        let mut ctrl = controller(&platforms, BotTuning::default());
        ctrl.set_relation(BotId(1), TargetRelation::Evade);
        let hoppy = HumanizeProfile {
            hesitation_chance: 0.0,
            evasive_hop_chance: 1.0,
            ..default()
        };
        ctrl.set_behavior(BotId(1), BehaviorPolicy::Humanized(hoppy));
        let bot = BodyState::new(Vec2::new(0.0, 1000.0));
        let pursuer = BodyState::new(Vec2::new(200.0, 1000.0));

        let intent = ctrl.tick(BotId(1), &bot, &pursuer, 16.0);
        assert!(intent.jump && intent.move_left);
        assert_eq!(ctrl.output_scale(BotId(1)).jump, 0.7);

        // No hops from the air
        let flying = bot.airborne(Vec2::new(-3.0, -4.0));
        assert!(!ctrl.tick(BotId(1), &flying, &pursuer, 16.0).jump);
        assert_eq!(ctrl.output_scale(BotId(1)).jump, 1.0);
    }
}
