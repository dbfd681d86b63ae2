//! Levels module - platform records, registry, and level database

mod database;

pub use database::*;

use bevy::prelude::*;

/// Label of the invisible ceiling. It is a `platform-` body but never walkable.
pub const CEILING_LABEL: &str = "platform-ceiling";

/// Check whether a body label names a walkable surface
pub fn is_walkable_label(label: &str) -> bool {
    label.starts_with("platform") && label != CEILING_LABEL
}

/// A static surface in the level. Immutable once the level is loaded.
///
/// Coordinates are screen space: +y points down, so the top edge of a
/// platform is `center.y - height / 2`.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    /// Label from level data (e.g. "platform-start-left")
    pub id: String,
    /// Center of the platform body
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    /// Rotation in radians
    pub angle: f32,
    /// Whether bots can stand on this platform (walls and ceiling cannot)
    pub walkable: bool,
}

impl Platform {
    /// Create an unrotated platform; walkability follows the label
    pub fn new(id: impl Into<String>, center: Vec2, width: f32, height: f32) -> Self {
        let id = id.into();
        let walkable = is_walkable_label(&id);
        Self {
            id,
            center,
            width,
            height,
            angle: 0.0,
            walkable,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_walkable(mut self, walkable: bool) -> Self {
        self.walkable = walkable;
        self
    }

    /// Half of the platform's extent along the x axis
    pub fn half_span(&self) -> f32 {
        self.width * self.angle.cos().abs() / 2.0
    }

    pub fn left_x(&self) -> f32 {
        self.center.x - self.half_span()
    }

    pub fn right_x(&self) -> f32 {
        self.center.x + self.half_span()
    }

    /// Y of the surface bodies stand on, where the top edge crosses `center.x`.
    /// Tilting lifts that crossing point above `center.y - height / 2`.
    pub fn top_y(&self) -> f32 {
        self.center.y - self.height / (2.0 * self.angle.cos().abs().max(f32::EPSILON))
    }

    /// dy/dx of the top edge (0.0 when flat, positive when it falls to the right)
    pub fn slope(&self) -> f32 {
        self.angle.tan()
    }
}

/// Directed link authored in level data, by platform label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthoredLink {
    pub from: String,
    pub to: String,
}

/// Read-only snapshot of the current level's platforms.
/// `revision` changes whenever the platform set is replaced, so consumers
/// can tell whether a graph built earlier still matches.
#[derive(Resource, Clone, Debug, Default)]
pub struct PlatformRegistry {
    pub level_name: String,
    pub platforms: Vec<Platform>,
    pub links: Vec<AuthoredLink>,
    pub world_size: Vec2,
    pub revision: u64,
}

impl PlatformRegistry {
    /// Build a registry for a level (revision 1)
    pub fn from_level(level: &LevelData) -> Self {
        let mut registry = Self::default();
        registry.load_level(level);
        registry
    }

    /// Replace the platform set with a level's platforms and bump the revision
    pub fn load_level(&mut self, level: &LevelData) {
        self.level_name = level.name.clone();
        self.platforms = level.platforms.clone();
        self.links = level.links.clone();
        self.world_size = level.world_size;
        self.revision += 1;
    }

    /// Find a platform by label
    pub fn get(&self, id: &str) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Number of walkable platforms
    pub fn walkable_count(&self) -> usize {
        self.platforms.iter().filter(|p| p.walkable).count()
    }
}
