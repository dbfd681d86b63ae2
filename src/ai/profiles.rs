//! Bot profiles - humanizing parameters
//!
//! Each profile sets how often a humanized bot hesitates, skips jumps,
//! hops while evading, and how much it varies its speed. Loaded from assets/bot_profiles.txt and hot-reloaded by
//! the config watcher.

use bevy::prelude::*;
use std::fs;

/// Path to bot profiles file
pub const BOT_PROFILES_FILE: &str = "assets/bot_profiles.txt";

/// Humanizing parameters loaded from config file
#[derive(Debug, Clone, PartialEq)]
pub struct HumanizeProfile {
    /// Profile name for display
    pub name: String,
    /// Chance per tick to start a hesitation while not already hesitating
    pub hesitation_chance: f64,
    /// Hesitation length range (ms)
    pub hesitation_min_ms: f32,
    pub hesitation_max_ms: f32,
    /// Chance a jump press is dropped
    pub jump_skip_chance: f64,
    /// Speed multiplier range handed to the actuator
    pub speed_min: f32,
    pub speed_max: f32,
    /// How often the speed multiplier is resampled (ms)
    pub speed_resample_ms: f32,
    /// Pause after the bot's role changes (ms)
    pub role_swap_pause_ms: f32,
    /// Chance per settled tick of a random hop while evading
    pub evasive_hop_chance: f64,
    /// Jump strength of an evasive hop, as a fraction of a full jump
    pub evasive_hop_strength: f32,
}

impl Default for HumanizeProfile {
    fn default() -> Self {
        Self {
            name: "Casual".to_string(),
            hesitation_chance: 0.12,
            hesitation_min_ms: 200.0,
            hesitation_max_ms: 400.0,
            jump_skip_chance: 0.1,
            speed_min: 0.9,
            speed_max: 1.1,
            speed_resample_ms: 1000.0,
            role_swap_pause_ms: 300.0,
            evasive_hop_chance: 0.05,
            evasive_hop_strength: 0.7,
        }
    }
}

/// Database of bot profiles loaded from file
#[derive(Resource)]
pub struct BotProfileDatabase {
    profiles: Vec<HumanizeProfile>,
}

impl Default for BotProfileDatabase {
    fn default() -> Self {
        Self::load_from_file(BOT_PROFILES_FILE)
    }
}

impl BotProfileDatabase {
    /// Load profiles from file, or return default if file doesn't exist
    pub fn load_from_file(path: &str) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not read bot profiles file: {}, using defaults", e);
                return Self::builtin();
            }
        };

        let profiles = parse_profiles(&content);
        if profiles.is_empty() {
            warn!("No profiles parsed from {}, using defaults", path);
            return Self::builtin();
        }

        info!("Loaded {} bot profiles from {}", profiles.len(), path);
        Self { profiles }
    }

    fn builtin() -> Self {
        Self {
            profiles: vec![HumanizeProfile::default()],
        }
    }

    /// Get profile by index, wrapping around if out of bounds
    pub fn get(&self, index: usize) -> &HumanizeProfile {
        &self.profiles[index % self.profiles.len()]
    }

    /// Get profile by name
    pub fn find(&self, name: &str) -> Option<&HumanizeProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Parse profiles from file content
fn parse_profiles(content: &str) -> Vec<HumanizeProfile> {
    let mut profiles = Vec::new();
    let mut current: Option<HumanizeProfile> = None;

    for line in content.lines() {
        let line = line.trim();

        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix("profile:") {
            if let Some(p) = current.take() {
                profiles.push(p);
            }
            current = Some(HumanizeProfile {
                name: name.trim().to_string(),
                ..default()
            });
            continue;
        }

        let Some(profile) = current.as_mut() else {
            continue;
        };

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "hesitation_chance" => set(&mut profile.hesitation_chance, value),
            "hesitation_min_ms" => set(&mut profile.hesitation_min_ms, value),
            "hesitation_max_ms" => set(&mut profile.hesitation_max_ms, value),
            "jump_skip_chance" => set(&mut profile.jump_skip_chance, value),
            "speed_min" => set(&mut profile.speed_min, value),
            "speed_max" => set(&mut profile.speed_max, value),
            "speed_resample_ms" => set(&mut profile.speed_resample_ms, value),
            "role_swap_pause_ms" => set(&mut profile.role_swap_pause_ms, value),
            "evasive_hop_chance" => set(&mut profile.evasive_hop_chance, value),
            "evasive_hop_strength" => set(&mut profile.evasive_hop_strength, value),
            other => warn!("Unknown bot profile key '{}'", other),
        }
    }

    // Don't forget the last profile
    if let Some(p) = current {
        profiles.push(p);
    }

    profiles
}

/// Overwrite `field` when `value` parses, keep the default otherwise
fn set<T: std::str::FromStr>(field: &mut T, value: &str) {
    if let Ok(v) = value.parse() {
        *field = v;
    }
}
