//! Core type definitions used throughout the codebase

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique runtime identifier for an actor in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistent spawn identifier, the key used by the formation store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnId(pub u32);

impl SpawnId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Wrap an angle into [0, 2π)
pub fn normalize_orientation(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Absolute angle of the vector pointing from `from` to `to`
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    normalize_orientation(delta.y.atan2(delta.x))
}

/// Polar decomposition of an offset relative to the origin: (range, angle)
pub fn to_polar(offset: Vec2) -> (f32, f32) {
    let range = offset.length();
    if range <= f32::EPSILON {
        return (0.0, 0.0);
    }
    (range, normalize_orientation(offset.y.atan2(offset.x)))
}

/// Milliseconds as a signed countdown step, saturating at `i32::MAX`
pub fn timer_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_orientation_wraps_negative() {
        let angle = normalize_orientation(-PI / 2.0);
        assert!((angle - 3.0 * PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_orientation_wraps_large() {
        let angle = normalize_orientation(5.0 * PI);
        assert!((angle - PI).abs() < 1e-4);
    }

    #[test]
    fn test_angle_between_cardinal_directions() {
        let origin = Vec2::ZERO;
        assert!(angle_between(origin, Vec2::new(1.0, 0.0)).abs() < 1e-6);
        assert!((angle_between(origin, Vec2::new(0.0, 1.0)) - PI / 2.0).abs() < 1e-6);
        assert!((angle_between(origin, Vec2::new(-1.0, 0.0)) - PI).abs() < 1e-6);
    }

    #[test]
    fn test_to_polar_zero_offset() {
        assert_eq!(to_polar(Vec2::ZERO), (0.0, 0.0));
    }

    #[test]
    fn test_to_polar_behind() {
        let (range, angle) = to_polar(Vec2::new(-3.0, 0.0));
        assert!((range - 3.0).abs() < 1e-6);
        assert!((angle - PI).abs() < 1e-6);
    }

    #[test]
    fn test_actor_ids_are_unique() {
        assert_ne!(ActorId::new(), ActorId::new());
    }

    #[test]
    fn test_timer_ms_saturates() {
        assert_eq!(timer_ms(0), 0);
        assert_eq!(timer_ms(1200), 1200);
        assert_eq!(timer_ms(i32::MAX as u32), i32::MAX);
        assert_eq!(timer_ms(i32::MAX as u32 + 1), i32::MAX);
        assert_eq!(timer_ms(u32::MAX), i32::MAX);
    }
}
