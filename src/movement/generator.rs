//! Movement generator contract
//!
//! A movement generator is a per-unit controller installed in one of the
//! unit's motion slots. The world ticks the generator in the highest
//! occupied slot; returning `false` from `update` tears it down.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::types::ActorId;
use crate::world::collision::CollisionMap;
use crate::world::unit::Unit;
use crate::world::{FormationRegistry, Units};

/// Kind reported by every movement generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementGeneratorType {
    Point,
    Formation,
}

/// Execution channel on a unit; higher slots override lower ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MotionSlot {
    /// Default behavior; formation movement lives here
    Idle = 0,
    /// Temporary orders
    Active = 1,
}

pub const MAX_MOTION_SLOT: usize = 2;

impl MotionSlot {
    pub const ALL: [MotionSlot; MAX_MOTION_SLOT] = [MotionSlot::Idle, MotionSlot::Active];
}

/// World state a generator may touch while ticking
///
/// The generator being ticked is detached from its owner for the duration
/// of the call, so the owner can be borrowed mutably through `units`.
pub struct MotionContext<'a> {
    pub units: &'a mut Units,
    pub formations: &'a FormationRegistry,
    pub collision: &'a CollisionMap,
}

/// Capability of generators that hold a formation offset
pub trait FormationOffsetReceiver {
    fn formation_offset(&self) -> Vec2;
    fn set_formation_offset(&mut self, offset: Vec2);
}

pub trait MovementGenerator: fmt::Debug {
    fn kind(&self) -> MovementGeneratorType;

    /// Called once when installed into a slot
    fn initialize(&mut self, owner: &mut Unit);

    /// Tick; `false` asks the caller to finalize and drop the generator
    fn update(&mut self, owner: ActorId, ctx: &mut MotionContext<'_>, diff: u32) -> bool;

    /// Called once when removed from its slot, for any reason
    fn finalize(&mut self, owner: &mut Unit);

    /// The owner's path completed
    fn movement_inform(&mut self, _owner: &mut Unit) {}

    fn as_offset_receiver(&mut self) -> Option<&mut dyn FormationOffsetReceiver> {
        None
    }
}
