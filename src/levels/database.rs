//! Level database - parsing and storage
//!
//! Format (one entry per line, `#` starts a comment):
//!
//! ```text
//! level: Arena
//! world: 3200 2400
//! platform: platform-ground 1600 2440 3200 100
//! platform: platform-mid-left-angled 600 1950 180 20 -11.25
//! solid: wall-left -50 1200 100 2400
//! link: platform-start-left platform-low-far-left
//! ```
//!
//! `platform:` walkability follows the label, `solid:` is never walkable.
//! Angles are in degrees.

use bevy::prelude::*;
use std::fs;

use crate::constants::*;
use crate::levels::{AuthoredLink, Platform};

/// Single level definition
#[derive(Clone, Debug)]
pub struct LevelData {
    pub name: String,
    pub world_size: Vec2,
    pub platforms: Vec<Platform>,
    pub links: Vec<AuthoredLink>,
}

impl LevelData {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            world_size: Vec2::new(WORLD_WIDTH, WORLD_HEIGHT),
            platforms: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Database of all loaded levels
#[derive(Resource, Default)]
pub struct LevelDatabase {
    pub levels: Vec<LevelData>,
}

impl LevelDatabase {
    /// Load levels from file, returns default hardcoded levels on error
    pub fn load_from_file(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!("Failed to load levels from {}: {}, using defaults", path, e);
                Self::default_levels()
            }
        }
    }

    /// Parse level data from string
    pub fn parse(content: &str) -> Self {
        let mut levels = Vec::new();
        let mut current_level: Option<LevelData> = None;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("level:") {
                if let Some(level) = current_level.take() {
                    levels.push(level);
                }
                current_level = Some(LevelData::named(name.trim()));
                continue;
            }

            let Some(level) = current_level.as_mut() else {
                warn!("levels line {}: entry before any 'level:' header", line_no + 1);
                continue;
            };

            if let Some(params) = line.strip_prefix("world:") {
                let parts: Vec<&str> = params.split_whitespace().collect();
                if parts.len() >= 2 {
                    if let (Ok(w), Ok(h)) = (parts[0].parse::<f32>(), parts[1].parse::<f32>()) {
                        level.world_size = Vec2::new(w, h);
                    }
                }
            } else if let Some(params) = line.strip_prefix("platform:") {
                match parse_platform(params) {
                    Some(platform) => level.platforms.push(platform),
                    None => warn!("levels line {}: malformed platform '{}'", line_no + 1, line),
                }
            } else if let Some(params) = line.strip_prefix("solid:") {
                match parse_platform(params) {
                    Some(platform) => level.platforms.push(platform.with_walkable(false)),
                    None => warn!("levels line {}: malformed solid '{}'", line_no + 1, line),
                }
            } else if let Some(params) = line.strip_prefix("link:") {
                let parts: Vec<&str> = params.split_whitespace().collect();
                if parts.len() == 2 {
                    level.links.push(AuthoredLink {
                        from: parts[0].to_string(),
                        to: parts[1].to_string(),
                    });
                } else {
                    warn!("levels line {}: link needs two labels", line_no + 1);
                }
            }
        }

        // Don't forget the last level
        if let Some(level) = current_level {
            levels.push(level);
        }

        if levels.is_empty() {
            warn!("No levels parsed, using defaults");
            return Self::default_levels();
        }

        info!("Loaded {} levels from file", levels.len());
        Self { levels }
    }

    /// Hardcoded fallback levels
    pub fn default_levels() -> Self {
        let mut simple = LevelData::named("Simple");
        simple.platforms = vec![
            Platform::new(
                "platform-ground",
                Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT + 40.0),
                WORLD_WIDTH,
                100.0,
            ),
            Platform::new("platform-low-left", Vec2::new(800.0, 2250.0), 400.0, 20.0),
            Platform::new("platform-low-right", Vec2::new(2400.0, 2250.0), 400.0, 20.0),
            Platform::new("platform-mid-center", Vec2::new(1600.0, 2100.0), 600.0, 20.0),
            Platform::new("platform-ceiling", Vec2::new(WORLD_WIDTH / 2.0, -50.0), WORLD_WIDTH, 100.0),
            Platform::new("wall-left", Vec2::new(-50.0, WORLD_HEIGHT / 2.0), 100.0, WORLD_HEIGHT),
            Platform::new(
                "wall-right",
                Vec2::new(WORLD_WIDTH + 50.0, WORLD_HEIGHT / 2.0),
                100.0,
                WORLD_HEIGHT,
            ),
        ];
        Self {
            levels: vec![simple],
        }
    }

    /// Get level by index
    pub fn get(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index)
    }

    /// Get level by name
    pub fn find(&self, name: &str) -> Option<&LevelData> {
        self.levels.iter().find(|l| l.name == name)
    }

    /// Get number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if database is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Parse `<label> <x> <y> <width> <height> [angle_degrees]`
fn parse_platform(params: &str) -> Option<Platform> {
    let parts: Vec<&str> = params.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }
    let x = parts[1].parse::<f32>().ok()?;
    let y = parts[2].parse::<f32>().ok()?;
    let width = parts[3].parse::<f32>().ok()?;
    let height = parts[4].parse::<f32>().ok()?;
    let angle = match parts.get(5) {
        Some(a) => a.parse::<f32>().ok()?.to_radians(),
        None => 0.0,
    };
    Some(Platform::new(parts[0], Vec2::new(x, y), width, height).with_angle(angle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# two levels
level: First
world: 1000 800
platform: platform-ground 500 790 1000 20
platform: platform-ledge 200 600 150 20 10
solid: wall-left -10 400 20 800
platform: platform-ceiling 500 -10 1000 20
link: platform-ground platform-ledge

level: Second
platform: platform-ground 500 790 1000 20
"#;

    #[test]
    fn test_parse_levels() {
        let db = LevelDatabase::parse(SAMPLE);
        assert_eq!(db.len(), 2);

        let first = db.find("First").unwrap();
        assert_eq!(first.world_size, Vec2::new(1000.0, 800.0));
        assert_eq!(first.platforms.len(), 4);
        assert_eq!(first.links.len(), 1);

        let ledge = &first.platforms[1];
        assert!((ledge.angle - 10.0_f32.to_radians()).abs() < 1e-5);
        assert!(ledge.walkable);
        assert!(!first.platforms[2].walkable);
        assert!(!first.platforms[3].walkable);

        let second = db.get(1).unwrap();
        assert_eq!(second.world_size, Vec2::new(WORLD_WIDTH, WORLD_HEIGHT));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let db = LevelDatabase::parse("level: X\nplatform: platform-a 1 2\nplatform: platform-b 0 0 10 10\n");
        assert_eq!(db.levels[0].platforms.len(), 1);
        assert_eq!(db.levels[0].platforms[0].id, "platform-b");
    }

    #[test]
    fn test_empty_content_uses_defaults() {
        let db = LevelDatabase::parse("# nothing here\n");
        assert_eq!(db.levels[0].name, "Simple");
    }
}
