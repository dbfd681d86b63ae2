//! Config file auto-reload system
//!
//! Polls the levels, bot tuning and bot profile files every 10 seconds and
//! reloads whatever was modified. A level reload bumps the registry revision,
//! which makes the nav graph rebuild on the next frame.

use bevy::prelude::*;
use std::fs;
use std::time::SystemTime;

use crate::ai::{BOT_PROFILES_FILE, BehaviorPolicy, BotBehavior, BotProfileDatabase};
use crate::constants::LEVELS_FILE;
use crate::levels::{LevelDatabase, PlatformRegistry};
use crate::tuning::{BOT_TUNING_FILE, BotTuning, load_bot_tuning};

/// How often to check for config changes (seconds)
const CHECK_INTERVAL: f32 = 10.0;

/// One watched file and its last known modification time
#[derive(Debug, Clone)]
pub struct WatchedFile {
    pub path: String,
    pub mtime: Option<SystemTime>,
}

impl WatchedFile {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            mtime: get_mtime(path),
        }
    }

    /// Has the file changed (or appeared/disappeared) since the last poll?
    pub fn poll(&mut self) -> bool {
        let mtime = get_mtime(&self.path);
        if mtime != self.mtime {
            self.mtime = mtime;
            true
        } else {
            false
        }
    }
}

/// Which files changed in one poll
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChanges {
    pub levels: bool,
    pub tuning: bool,
    pub profiles: bool,
}

/// Tracks modification times of config files for hot-reload
#[derive(Resource)]
pub struct ConfigWatcher {
    /// Time since last check
    pub timer: f32,
    pub levels: WatchedFile,
    pub tuning: WatchedFile,
    pub profiles: WatchedFile,
}

impl Default for ConfigWatcher {
    fn default() -> Self {
        Self::new(LEVELS_FILE, BOT_TUNING_FILE, BOT_PROFILES_FILE)
    }
}

impl ConfigWatcher {
    pub fn new(levels_path: &str, tuning_path: &str, profiles_path: &str) -> Self {
        Self {
            timer: 0.0,
            levels: WatchedFile::new(levels_path),
            tuning: WatchedFile::new(tuning_path),
            profiles: WatchedFile::new(profiles_path),
        }
    }

    /// Check every file once
    pub fn poll_changes(&mut self) -> ConfigChanges {
        ConfigChanges {
            levels: self.levels.poll(),
            tuning: self.tuning.poll(),
            profiles: self.profiles.poll(),
        }
    }
}

/// Get file modification time, or None if file doesn't exist
fn get_mtime(path: &str) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Adds the watcher resource and its polling system
pub struct ConfigWatchPlugin;

impl Plugin for ConfigWatchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConfigWatcher>()
            .init_resource::<LevelDatabase>()
            .init_resource::<BotProfileDatabase>()
            .add_systems(Update, check_config_changes);
    }
}

/// Check for config file changes and reload as needed.
/// Runs every 10 seconds.
pub fn check_config_changes(
    time: Res<Time>,
    mut watcher: ResMut<ConfigWatcher>,
    mut level_db: ResMut<LevelDatabase>,
    mut registry: ResMut<PlatformRegistry>,
    mut tuning: ResMut<BotTuning>,
    mut profile_db: ResMut<BotProfileDatabase>,
    mut behaviors: Query<&mut BotBehavior>,
) {
    watcher.timer += time.delta_secs();

    if watcher.timer < CHECK_INTERVAL {
        return;
    }
    watcher.timer = 0.0;

    let changes = watcher.poll_changes();

    if changes.levels {
        *level_db = LevelDatabase::load_from_file(&watcher.levels.path);
        info!("Auto-reloaded levels from {}", watcher.levels.path);

        match level_db.find(&registry.level_name) {
            Some(level) => registry.load_level(level),
            None => warn!(
                "Level '{}' missing after reload, keeping current platforms",
                registry.level_name
            ),
        }
    }

    if changes.tuning {
        *tuning = load_bot_tuning(&watcher.tuning.path);
        info!("Auto-reloaded bot tuning from {}", watcher.tuning.path);
    }

    if changes.profiles {
        *profile_db = BotProfileDatabase::load_from_file(&watcher.profiles.path);
        info!("Auto-reloaded bot profiles from {}", watcher.profiles.path);

        // Humanized bots pick up the new values of their named profile
        for mut behavior in &mut behaviors {
            let BehaviorPolicy::Humanized(profile) = &behavior.0 else {
                continue;
            };
            if let Some(updated) = profile_db.find(&profile.name) {
                if updated != profile {
                    behavior.0 = BehaviorPolicy::Humanized(updated.clone());
                }
            }
        }
    }
}
