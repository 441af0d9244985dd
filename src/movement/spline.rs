//! In-flight paths and the command that launches them
//!
//! A path is a straight segment travelled at constant velocity. Collision
//! is resolved when the destination is chosen, not while travelling.

use glam::Vec2;

use crate::core::types::angle_between;
use crate::movement::flags::select_speed_type;
use crate::world::unit::Unit;

const ARRIVAL_EPSILON: f32 = 1e-4;

/// Path currently being executed by a unit
#[derive(Debug, Clone, PartialEq)]
pub struct MoveSpline {
    start: Vec2,
    destination: Vec2,
    velocity: f32,
    duration_ms: u32,
    elapsed_ms: u32,
    finalized: bool,
}

impl Default for MoveSpline {
    fn default() -> Self {
        Self {
            start: Vec2::ZERO,
            destination: Vec2::ZERO,
            velocity: 0.0,
            duration_ms: 0,
            elapsed_ms: 0,
            finalized: true,
        }
    }
}

impl MoveSpline {
    /// Start a path from `start` to `destination`
    ///
    /// A path without distance or without velocity is finalized at once.
    pub fn new(start: Vec2, destination: Vec2, velocity: f32) -> Self {
        let distance = start.distance(destination);
        let movable = velocity > 0.0 && velocity.is_finite() && distance > ARRIVAL_EPSILON;
        let duration_ms = if movable {
            ((distance / velocity) * 1000.0).ceil() as u32
        } else {
            0
        };

        Self {
            start,
            destination,
            velocity,
            duration_ms,
            elapsed_ms: 0,
            finalized: !movable,
        }
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn current_destination(&self) -> Vec2 {
        self.destination
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Position along the path at the current elapsed time
    pub fn position(&self) -> Vec2 {
        if self.duration_ms == 0 {
            return self.start;
        }
        let t = (self.elapsed_ms as f32 / self.duration_ms as f32).min(1.0);
        self.start.lerp(self.destination, t)
    }

    /// Advance by `diff` ms, returning true if the path completed on this call
    pub fn update(&mut self, diff: u32) -> bool {
        if self.finalized {
            return false;
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(diff).min(self.duration_ms);
        if self.elapsed_ms >= self.duration_ms {
            self.finalized = true;
            return true;
        }
        false
    }

    /// Finalize the path where it currently is
    pub fn stop(&mut self) -> Vec2 {
        let position = self.position();
        self.start = position;
        self.destination = position;
        self.duration_ms = 0;
        self.elapsed_ms = 0;
        self.finalized = true;
        position
    }
}

/// Builder for a single-segment path command
#[derive(Debug, Clone, Default)]
pub struct MoveSplineInit {
    destination: Option<Vec2>,
    velocity: Option<f32>,
    facing_locked: bool,
}

impl MoveSplineInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, destination: Vec2) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn set_velocity(mut self, velocity: f32) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Keep the unit's orientation instead of turning toward the destination
    pub fn set_facing_locked(mut self, locked: bool) -> Self {
        self.facing_locked = locked;
        self
    }

    /// Replace `owner`'s current path with this one, effective immediately
    ///
    /// Without an explicit velocity the owner's speed for its current
    /// movement flags is used. Without a destination the owner stops.
    pub fn launch(self, owner: &mut Unit) {
        let position = owner.position;
        let destination = self.destination.unwrap_or(position);
        let velocity = self
            .velocity
            .unwrap_or_else(|| owner.speed(select_speed_type(owner.movement_flags)));

        if !self.facing_locked && position.distance(destination) > ARRIVAL_EPSILON {
            owner.orientation = angle_between(position, destination);
        }

        owner.move_spline = MoveSpline::new(position, destination, velocity);
    }
}
