//! Scenario execution engine
//!
//! Drives a `BotController` tick by tick with scripted bot and target bodies.
//! Bodies only move when a tick group says so; there is no physics step, so
//! a bot that is told to move but never does looks pinned to the detector.

use bevy::prelude::*;
use serde::Serialize;

use crate::ai::{BotController, BotId, NavGraph, TargetRelation};
use crate::constants::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::levels::{AuthoredLink, LevelData, LevelDatabase, Platform, PlatformRegistry};
use crate::player::BodyState;
use crate::tuning::BotTuning;

use super::assertions::{AssertionError, check_final_state, check_graph, check_intent};
use super::parser::{BodyDef, ScenarioDefinition, ScenarioSetup};

/// What a passing run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    /// Ticks whose intent had jump pressed
    pub jumps: u32,
    /// Bot mode after the last tick (None when no ticks ran)
    pub final_mode: Option<String>,
    pub nodes: usize,
    pub edges: usize,
}

/// Result of running a scenario
#[derive(Debug)]
pub enum TestResult {
    Pass { summary: RunSummary },
    Fail { error: AssertionError },
    Error { message: String },
}

/// Bot id used for the single scripted bot
const SCENARIO_BOT: BotId = BotId(1);

impl BodyDef {
    fn to_body(self) -> BodyState {
        BodyState {
            position: Vec2::new(self.x, self.y),
            velocity: Vec2::new(self.vx, self.vy),
            grounded: self.grounded,
        }
    }
}

/// Platform set for a scenario: a named level, or inline platforms
fn build_registry(setup: &ScenarioSetup, level_db: &LevelDatabase) -> Result<PlatformRegistry, String> {
    if let Some(name) = &setup.level {
        let level = level_db.find(name).ok_or_else(|| {
            format!(
                "Level '{}' not found. Available: {:?}",
                name,
                level_db.levels.iter().map(|l| &l.name).collect::<Vec<_>>()
            )
        })?;
        return Ok(PlatformRegistry::from_level(level));
    }

    if setup.platforms.is_empty() {
        return Err("Scenario needs either setup.level or setup.platforms".to_string());
    }

    let platforms = setup
        .platforms
        .iter()
        .map(|def| {
            let platform = Platform::new(def.id.clone(), Vec2::new(def.x, def.y), def.width, def.height)
                .with_angle(def.angle.to_radians());
            match def.walkable {
                Some(walkable) => platform.with_walkable(walkable),
                None => platform,
            }
        })
        .collect();

    let links = setup
        .links
        .iter()
        .map(|[from, to]| AuthoredLink {
            from: from.clone(),
            to: to.clone(),
        })
        .collect();

    Ok(PlatformRegistry::from_level(&LevelData {
        name: "scenario".to_string(),
        world_size: Vec2::new(WORLD_WIDTH, WORLD_HEIGHT),
        platforms,
        links,
    }))
}

/// Run a single scenario with default tuning
pub fn run_scenario(def: &ScenarioDefinition, level_db: &LevelDatabase) -> TestResult {
    run_scenario_with(def, level_db, &BotTuning::default())
}

/// Run a single scenario. `base_tuning` applies unless the scenario sets its own.
pub fn run_scenario_with(
    def: &ScenarioDefinition,
    level_db: &LevelDatabase,
    base_tuning: &BotTuning,
) -> TestResult {
    let registry = match build_registry(&def.setup, level_db) {
        Ok(registry) => registry,
        Err(message) => return TestResult::Error { message },
    };

    let tuning = def.setup.tuning.clone().unwrap_or_else(|| base_tuning.clone());
    let graph = NavGraph::build_from_registry(&registry, tuning.jump_profile());

    if let Err(error) = check_graph(&def.expect, &graph) {
        return TestResult::Fail { error };
    }

    let mut controller = BotController::new(std::sync::Arc::new(graph), tuning);
    if def.setup.evade {
        controller.set_relation(SCENARIO_BOT, TargetRelation::Evade);
    }
    let mut ticks = 0u64;
    let mut jumps = 0u32;

    if !def.ticks.is_empty() {
        let (Some(bot), Some(target)) = (def.setup.bot, def.setup.target) else {
            return TestResult::Error {
                message: "Ticks need setup.bot and setup.target".to_string(),
            };
        };
        let mut bot = bot.to_body();
        let mut target = target.to_body();

        for group in &def.ticks {
            if let Some(b) = group.bot {
                bot = b.to_body();
            }
            if let Some(t) = group.target {
                target = t.to_body();
            }

            for _ in 0..group.repeat {
                let intent = controller.tick(SCENARIO_BOT, &bot, &target, group.dt_ms);
                if intent.jump {
                    jumps += 1;
                }
                if let Some(expected) = &group.expect {
                    if let Err(error) = check_intent(ticks, expected, &intent) {
                        return TestResult::Fail { error };
                    }
                }
                ticks += 1;
            }
        }
    }

    let state = controller.state(SCENARIO_BOT).filter(|_| ticks > 0);
    if let Err(error) = check_final_state(&def.expect, controller.graph(), state, jumps) {
        return TestResult::Fail { error };
    }

    TestResult::Pass {
        summary: RunSummary {
            ticks,
            jumps,
            final_mode: state.map(|s| format!("{:?}", s.mode)),
            nodes: controller.graph().nodes.len(),
            edges: controller.graph().edge_count(),
        },
    }
}
