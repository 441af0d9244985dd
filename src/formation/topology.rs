//! Formation topologies and their offset geometry
//!
//! Each topology maps a follower's formation index to a 2D offset relative
//! to the leader. X points forward along the leader's facing, Y to the
//! leader's left.

use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::FormationError;

/// Shape a formation arranges its followers in
///
/// Discriminants are the values used by the formation store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FormationType {
    /// Scattered within a square of half-width `radius`
    Random = 0,
    /// Single file, leader at the front
    SingleFile = 1,
    /// Side by side, leader in the center
    SideBySide = 2,
    /// Not implemented, followers sit on the leader
    LikeGeese = 3,
    /// Half circle behind the leader
    FannedOutBehind = 4,
    /// Half circle in front of the leader
    FannedOutInFront = 5,
    /// Full circle around the leader
    CircleAroundLeader = 6,
    /// Not implemented, followers sit on the leader
    Marching = 7,
    /// Placement handled by the default follow behavior
    GridBehindLeader = 8,
}

impl FormationType {
    pub const ALL: [FormationType; 9] = [
        FormationType::Random,
        FormationType::SingleFile,
        FormationType::SideBySide,
        FormationType::LikeGeese,
        FormationType::FannedOutBehind,
        FormationType::FannedOutInFront,
        FormationType::CircleAroundLeader,
        FormationType::Marching,
        FormationType::GridBehindLeader,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormationType::Random => "random",
            FormationType::SingleFile => "single_file",
            FormationType::SideBySide => "side_by_side",
            FormationType::LikeGeese => "like_geese",
            FormationType::FannedOutBehind => "fanned_out_behind",
            FormationType::FannedOutInFront => "fanned_out_in_front",
            FormationType::CircleAroundLeader => "circle",
            FormationType::Marching => "marching",
            FormationType::GridBehindLeader => "grid_behind_leader",
        }
    }

    /// Whether offsets depend only on index, count and radius
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, FormationType::Random)
    }

    /// Offset of the follower at `index` in a formation of `follower_count`
    ///
    /// `follower_count` must be at least `index + 1`. Random draws a fresh
    /// offset on every call; every other topology is a pure function of its
    /// inputs.
    pub fn offset<R: Rng + ?Sized>(
        &self,
        index: u32,
        follower_count: usize,
        radius: f32,
        rng: &mut R,
    ) -> Vec2 {
        match self {
            FormationType::Random => random_offset(radius, rng),
            FormationType::SingleFile => single_file_offset(index, radius),
            FormationType::SideBySide => side_by_side_offset(index, radius),
            FormationType::FannedOutBehind => fanned_out_offset(index, follower_count, radius),
            FormationType::FannedOutInFront => {
                let offset = fanned_out_offset(index, follower_count, radius);
                // Both fans start on the left side, only the depth flips
                Vec2::new(-offset.x, offset.y)
            }
            FormationType::CircleAroundLeader => circle_offset(index, follower_count, radius),
            // TODO: LikeGeese and Marching need reference captures of the shape
            FormationType::LikeGeese | FormationType::Marching => Vec2::ZERO,
            FormationType::GridBehindLeader => Vec2::ZERO,
        }
    }
}

impl Default for FormationType {
    fn default() -> Self {
        FormationType::GridBehindLeader
    }
}

impl fmt::Display for FormationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for FormationType {
    type Error = FormationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FormationType::ALL
            .get(value as usize)
            .copied()
            .ok_or(FormationError::UnknownFormationType(value))
    }
}

impl FromStr for FormationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Ok(value) = normalized.parse::<u8>() {
            return FormationType::try_from(value).map_err(|e| e.to_string());
        }

        match normalized.as_str() {
            "circle_around_leader" => return Ok(FormationType::CircleAroundLeader),
            "grid" => return Ok(FormationType::GridBehindLeader),
            _ => {}
        }

        FormationType::ALL
            .iter()
            .find(|t| t.name() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown formation type: {}", s))
    }
}

fn random_offset<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Vec2 {
    if !radius.is_finite() {
        return Vec2::ZERO;
    }
    // Sampled on the unit square so huge radii cannot overflow the range
    let radius = radius.abs();
    Vec2::new(
        rng.gen_range(-1.0f32..=1.0) * radius,
        rng.gen_range(-1.0f32..=1.0) * radius,
    )
}

fn single_file_offset(index: u32, radius: f32) -> Vec2 {
    Vec2::new(-radius * (index + 1) as f32, 0.0)
}

fn side_by_side_offset(index: u32, radius: f32) -> Vec2 {
    let left = (index + 1) % 2 != 0;
    let rank = ((index + 1) as f32 / 2.0).ceil();
    let lateral = (if left { radius } else { -radius }) * rank;
    Vec2::new(0.0, lateral)
}

/// Number of arc steps a fan of `follower_count` is split into
///
/// Two or fewer followers split the half circle by their count, larger
/// groups use one step less than their count but never fewer than three.
pub fn fan_divider(follower_count: usize) -> usize {
    if follower_count <= 2 {
        follower_count
    } else {
        (follower_count - 1).max(3)
    }
}

fn fanned_out_offset(index: u32, follower_count: usize, radius: f32) -> Vec2 {
    let divider = fan_divider(follower_count).max(1);
    let step = PI / divider as f32;
    let angle = FRAC_PI_2 + step * index as f32;
    Vec2::new(angle.cos() * radius, angle.sin() * radius)
}

fn circle_offset(index: u32, follower_count: usize, radius: f32) -> Vec2 {
    let step = TAU / follower_count.max(1) as f32;
    let angle = step * index as f32;
    Vec2::new(angle.cos() * radius, angle.sin() * radius)
}
