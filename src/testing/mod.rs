//! Scenario testing system for deterministic navigation testing
//!
//! Scenarios are TOML files that describe a platform set, scripted bot and
//! target bodies, and the intents, graph edges and bot state they should
//! produce.

pub mod assertions;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, check_final_state, check_graph, check_intent};
pub use parser::{
    BodyDef, IntentExpectation, PlatformDef, ScenarioDefinition, ScenarioExpectations,
    ScenarioSetup, TickGroup, parse_scenario_file,
};
pub use runner::{RunSummary, TestResult, run_scenario, run_scenario_with};

/// Default path for test scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
