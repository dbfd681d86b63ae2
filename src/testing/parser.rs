//! TOML scenario file parsing

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::tuning::BotTuning;

/// Complete scenario definition from TOML file
#[derive(Debug, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub description: Option<String>,
    pub setup: ScenarioSetup,
    #[serde(default)]
    pub ticks: Vec<TickGroup>,
    #[serde(default)]
    pub expect: ScenarioExpectations,
}

/// Platforms, tuning and starting bodies
#[derive(Debug, Deserialize)]
pub struct ScenarioSetup {
    /// Level from the levels file, used instead of `platforms` when set
    pub level: Option<String>,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
    /// Authored links between `platforms`, by label
    #[serde(default)]
    pub links: Vec<[String; 2]>,
    /// Overrides on top of the default tuning; replaces the runner's base tuning
    #[serde(default)]
    pub tuning: Option<BotTuning>,
    pub bot: Option<BodyDef>,
    pub target: Option<BodyDef>,
    /// The bot runs from the target instead of chasing it
    #[serde(default)]
    pub evade: bool,
}

/// Platform given by center, size and angle in degrees
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDef {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    #[serde(default = "default_platform_height")]
    pub height: f32,
    #[serde(default)]
    pub angle: f32,
    /// Overrides the label rule when set
    pub walkable: Option<bool>,
}

fn default_platform_height() -> f32 {
    20.0
}

/// Body snapshot; position is the feet
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BodyDef {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
    #[serde(default = "default_grounded")]
    pub grounded: bool,
}

fn default_grounded() -> bool {
    true
}

/// A run of identical ticks
#[derive(Debug, Deserialize)]
pub struct TickGroup {
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default = "default_dt_ms")]
    pub dt_ms: f32,
    /// New bot body from this group on
    pub bot: Option<BodyDef>,
    /// New target body from this group on
    pub target: Option<BodyDef>,
    /// Checked on every tick of the group
    pub expect: Option<IntentExpectation>,
}

fn default_repeat() -> u32 {
    1
}

fn default_dt_ms() -> f32 {
    100.0
}

/// Expected intent fields (unset = don't care)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentExpectation {
    pub move_left: Option<bool>,
    pub move_right: Option<bool>,
    pub jump: Option<bool>,
}

/// Expected outcomes after all ticks
#[derive(Debug, Default, Deserialize)]
pub struct ScenarioExpectations {
    /// Total ticks with jump pressed
    pub jumps: Option<u32>,
    /// Final bot mode ("Idle", "FollowingPath", "StuckRecovery")
    pub mode: Option<String>,
    /// Final remaining path, by platform label
    pub path: Option<Vec<String>>,
    /// Directed graph edges that must exist
    #[serde(default)]
    pub edges: Vec<[String; 2]>,
    /// Directed graph edges that must not exist
    #[serde(default)]
    pub no_edges: Vec<[String; 2]>,
    /// Pairs connected by a path
    #[serde(default)]
    pub reachable: Vec<[String; 2]>,
    /// Pairs with no path
    #[serde(default)]
    pub unreachable: Vec<[String; 2]>,
}

/// Parse a scenario file from path
pub fn parse_scenario_file(path: &Path) -> Result<ScenarioDefinition, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let toml = r#"
name = "Test"
[setup]
[[setup.platforms]]
id = "platform-a"
x = 100.0
y = 10.0
width = 200.0

[setup.tuning]
jump_reach = 150.0

[setup.bot]
x = 50.0
y = 0.0

[[ticks]]
repeat = 3
expect = { move_right = true }

[expect]
edges = [["platform-a", "platform-b"]]
"#;
        let def: ScenarioDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "Test");
        assert_eq!(def.setup.platforms[0].height, 20.0);
        assert_eq!(def.setup.tuning.unwrap().jump_reach, 150.0);
        assert!(def.setup.bot.unwrap().grounded);
        assert_eq!(def.ticks[0].repeat, 3);
        assert!(!def.setup.evade);
        assert_eq!(def.ticks[0].dt_ms, 100.0);
        assert_eq!(def.expect.edges.len(), 1);
    }
}
