//! Actors that can lead or follow a formation

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{angle_between, normalize_orientation, ActorId, SpawnId};
use crate::movement::flags::{
    select_speed_type, MovementFlags, UnitMoveType, UnitState, MAX_MOVE_TYPE,
};
use crate::movement::formation::FormationMovementGenerator;
use crate::movement::generator::{MotionSlot, MovementGenerator, MovementGeneratorType};
use crate::movement::motion_master::MotionMaster;
use crate::movement::point::PointMovementGenerator;
use crate::movement::spline::MoveSpline;
use crate::world::collision::CollisionMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Player,
    Creature,
}

/// Hook for a unit's decision-making layer
pub trait UnitAi: fmt::Debug {
    /// A movement generator of `kind` finished a leg; `id` is generator specific
    fn movement_inform(&mut self, kind: MovementGeneratorType, id: u32);
}

#[derive(Debug)]
pub struct Unit {
    pub id: ActorId,
    pub kind: UnitKind,
    /// Key into the formation store, creatures only
    pub spawn_id: Option<SpawnId>,
    pub position: Vec2,
    pub orientation: f32,
    /// Point the unit returns to after leaving combat
    pub home_position: Vec2,
    pub state: UnitState,
    pub movement_flags: MovementFlags,
    pub move_spline: MoveSpline,
    pub motion_master: MotionMaster,
    speed_rates: [f32; MAX_MOVE_TYPE],
    formation_leader: Option<ActorId>,
    ai: Option<Box<dyn UnitAi>>,
}

impl Unit {
    fn new(kind: UnitKind, spawn_id: Option<SpawnId>, position: Vec2) -> Self {
        Self {
            id: ActorId::new(),
            kind,
            spawn_id,
            position,
            orientation: 0.0,
            home_position: position,
            state: UnitState::default(),
            movement_flags: MovementFlags::default(),
            move_spline: MoveSpline::default(),
            motion_master: MotionMaster::new(),
            speed_rates: [1.0; MAX_MOVE_TYPE],
            formation_leader: None,
            ai: None,
        }
    }

    pub fn creature(spawn_id: Option<SpawnId>, position: Vec2) -> Self {
        Self::new(UnitKind::Creature, spawn_id, position)
    }

    pub fn player(position: Vec2) -> Self {
        Self::new(UnitKind::Player, None, position)
    }

    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.orientation = normalize_orientation(orientation);
        self
    }

    pub fn with_ai(mut self, ai: Box<dyn UnitAi>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn is_player(&self) -> bool {
        self.kind == UnitKind::Player
    }

    pub fn is_creature(&self) -> bool {
        self.kind == UnitKind::Creature
    }

    /// Current speed for `move_type` in units per second
    pub fn speed(&self, move_type: UnitMoveType) -> f32 {
        move_type.base_speed() * self.speed_rates[move_type as usize]
    }

    pub fn set_speed_rate(&mut self, move_type: UnitMoveType, rate: f32) {
        self.speed_rates[move_type as usize] = rate.max(0.0);
    }

    pub fn has_state(&self, state: UnitState) -> bool {
        self.state.intersects(state)
    }

    pub fn add_state(&mut self, state: UnitState) {
        self.state.insert(state);
    }

    pub fn clear_state(&mut self, state: UnitState) {
        self.state.remove(state);
    }

    /// Rooted, stunned, dead, distracted or casting
    pub fn cannot_move(&self) -> bool {
        self.has_state(UnitState::NOT_MOVE | UnitState::CASTING)
    }

    pub fn is_moving(&self) -> bool {
        self.movement_flags.intersects(MovementFlags::MASK_MOVING) || !self.move_spline.finalized()
    }

    /// Angle to `target` measured from the unit's facing, in [0, 2π)
    pub fn relative_angle(&self, target: Vec2) -> f32 {
        normalize_orientation(angle_between(self.position, target) - self.orientation)
    }

    /// Halt any in-flight path and manual motion where the unit stands
    pub fn stop_moving(&mut self) {
        if !self.move_spline.finalized() {
            self.position = self.move_spline.stop();
        }
        self.movement_flags.remove(MovementFlags::MASK_MOVING);
    }

    /// Leader this creature is following, if any
    pub fn formation_leader(&self) -> Option<ActorId> {
        self.formation_leader
    }

    /// Players never record a formation leader
    pub fn set_formation_leader(&mut self, leader: Option<ActorId>) {
        if self.is_creature() {
            self.formation_leader = leader;
        }
    }

    /// Install `generator` into `slot`, finalizing whatever it replaces
    pub fn start_movement(&mut self, slot: MotionSlot, mut generator: Box<dyn MovementGenerator>) {
        if let Some(mut previous) = self.motion_master.take(slot) {
            previous.finalize(self);
        }
        generator.initialize(self);
        self.motion_master.replace(slot, generator);
    }

    /// Follow `leader` at `offset` from the idle slot
    pub fn move_formation(&mut self, leader: ActorId, offset: Vec2) {
        self.start_movement(
            MotionSlot::Idle,
            Box::new(FormationMovementGenerator::new(leader, offset)),
        );
    }

    /// Move to `destination` as a temporary order
    pub fn move_point(&mut self, id: u32, destination: Vec2) {
        self.move_point_in_slot(MotionSlot::Active, id, destination);
    }

    pub fn move_point_in_slot(&mut self, slot: MotionSlot, id: u32, destination: Vec2) {
        self.start_movement(slot, Box::new(PointMovementGenerator::new(id, destination)));
    }

    /// Finalize and drop the generator in `slot`
    pub fn clear_motion_slot(&mut self, slot: MotionSlot) {
        if let Some(mut generator) = self.motion_master.take(slot) {
            generator.finalize(self);
        }
    }

    /// Clear the idle slot, but only while formation movement owns it
    pub fn clear_formation_movement(&mut self) {
        if self.motion_master.slot_type(MotionSlot::Idle) == Some(MovementGeneratorType::Formation) {
            self.clear_motion_slot(MotionSlot::Idle);
        }
    }

    pub fn clear_all_motion(&mut self) {
        for slot in MotionSlot::ALL {
            self.clear_motion_slot(slot);
        }
    }

    pub fn movement_inform(&mut self, kind: MovementGeneratorType, id: u32) {
        tracing::trace!("Unit {:?} movement inform {:?} ({})", self.id, kind, id);
        if let Some(ai) = self.ai.as_mut() {
            ai.movement_inform(kind, id);
        }
    }

    /// Advance the unit's own motion by `diff` ms
    ///
    /// An in-flight path takes precedence over manual motion. Returns true
    /// if the path completed during this call.
    pub fn update_movement(&mut self, diff: u32, collision: &CollisionMap) -> bool {
        if !self.move_spline.finalized() {
            let completed = self.move_spline.update(diff);
            self.position = self.move_spline.position();
            return completed;
        }

        let forward = self.movement_flags.contains(MovementFlags::FORWARD);
        let backward = self.movement_flags.contains(MovementFlags::BACKWARD);
        if forward == backward {
            return false;
        }

        let heading = if forward {
            self.orientation
        } else {
            self.orientation + std::f32::consts::PI
        };
        let distance = self.speed(select_speed_type(self.movement_flags)) * diff as f32 / 1000.0;
        self.position = collision.move_position_to_first_collision(self.position, distance, heading);
        false
    }
}
