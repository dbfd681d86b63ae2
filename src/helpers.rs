//! Utility functions for tagbot

/// Sign of `delta` with a dead zone: -1.0, 0.0 or 1.0.
/// Values within `dead_zone` of zero map to 0.0.
pub fn sign_with_dead_zone(delta: f32, dead_zone: f32) -> f32 {
    if delta > dead_zone {
        1.0
    } else if delta < -dead_zone {
        -1.0
    } else {
        0.0
    }
}

/// Blend `current` toward `target` by `factor` (0.0 = stay, 1.0 = snap)
pub fn blend_toward(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// Distance from `x` to the closed interval [left, right] (0.0 inside it)
pub fn distance_to_span(x: f32, left: f32, right: f32) -> f32 {
    if x < left {
        left - x
    } else if x > right {
        x - right
    } else {
        0.0
    }
}
