//! Unit state and movement flags, move types and base speeds

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Transient unit states relevant to movement
    pub struct UnitState: u32 {
        const DIED = 1 << 0;
        const STUNNED = 1 << 1;
        const ROOT = 1 << 2;
        const DISTRACTED = 1 << 3;
        const CONFUSED = 1 << 4;
        const FLEEING = 1 << 5;
        /// Casting a spell that locks movement
        const CASTING = 1 << 6;
        /// Owned by a roaming generator (formation, random, waypoint)
        const ROAMING = 1 << 7;
        /// A roaming generator has a path in flight
        const ROAMING_MOVE = 1 << 8;

        const NOT_MOVE = Self::DIED.bits | Self::STUNNED.bits | Self::ROOT.bits
            | Self::DISTRACTED.bits;
    }
}

impl Default for UnitState {
    fn default() -> Self {
        UnitState::empty()
    }
}

bitflags! {
    /// How a unit is currently moving
    pub struct MovementFlags: u32 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const STRAFE_LEFT = 1 << 2;
        const STRAFE_RIGHT = 1 << 3;
        const WALKING = 1 << 4;
        const SWIMMING = 1 << 5;
        const FLYING = 1 << 6;

        const MASK_MOVING = Self::FORWARD.bits | Self::BACKWARD.bits
            | Self::STRAFE_LEFT.bits | Self::STRAFE_RIGHT.bits;
    }
}

impl Default for MovementFlags {
    fn default() -> Self {
        MovementFlags::empty()
    }
}

/// Movement mode a speed applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitMoveType {
    Walk = 0,
    Run = 1,
    RunBack = 2,
    Swim = 3,
    SwimBack = 4,
    Flight = 5,
    FlightBack = 6,
}

pub const MAX_MOVE_TYPE: usize = 7;

/// Base speeds in world units per second, indexed by `UnitMoveType`
pub const BASE_MOVE_SPEED: [f32; MAX_MOVE_TYPE] = [
    2.5,      // Walk
    7.0,      // Run
    4.5,      // RunBack
    4.722222, // Swim
    2.5,      // SwimBack
    7.0,      // Flight
    4.5,      // FlightBack
];

impl UnitMoveType {
    pub fn base_speed(&self) -> f32 {
        BASE_MOVE_SPEED[*self as usize]
    }
}

/// Pick the speed type matching a unit's movement flags
///
/// Flying wins over swimming, swimming over walking, walking over running
/// backward.
pub fn select_speed_type(flags: MovementFlags) -> UnitMoveType {
    let backward = flags.contains(MovementFlags::BACKWARD);

    if flags.contains(MovementFlags::FLYING) {
        if backward {
            UnitMoveType::FlightBack
        } else {
            UnitMoveType::Flight
        }
    } else if flags.contains(MovementFlags::SWIMMING) {
        if backward {
            UnitMoveType::SwimBack
        } else {
            UnitMoveType::Swim
        }
    } else if flags.contains(MovementFlags::WALKING) {
        UnitMoveType::Walk
    } else if backward {
        UnitMoveType::RunBack
    } else {
        UnitMoveType::Run
    }
}
