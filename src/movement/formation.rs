//! Follower movement for formations
//!
//! Each follower runs a `FormationMovementGenerator` in its idle slot. On
//! the leader's formation cadence it predicts where the leader will be,
//! applies its formation offset around that point and launches a path
//! there, scaling its speed so it keeps up.

use glam::Vec2;

use crate::core::config::config;
use crate::core::types::{timer_ms, to_polar, ActorId};
use crate::movement::flags::{select_speed_type, UnitState};
use crate::movement::generator::{
    FormationOffsetReceiver, MotionContext, MovementGenerator, MovementGeneratorType,
};
use crate::movement::spline::MoveSplineInit;
use crate::world::collision::CollisionMap;
use crate::world::unit::Unit;

/// Leader motion captured before the follower is borrowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderMotion {
    pub position: Vec2,
    pub orientation: f32,
    pub is_creature: bool,
    pub spline_finalized: bool,
    /// Leader's heading toward its path destination, relative to its facing
    pub relative_heading: f32,
    /// Path velocity while a path is in flight, nominal speed otherwise
    pub velocity: f32,
    pub is_moving: bool,
}

impl LeaderMotion {
    pub fn capture(leader: &Unit) -> Self {
        let spline_finalized = leader.move_spline.finalized();
        let relative_heading = if spline_finalized {
            0.0
        } else {
            leader.relative_angle(leader.move_spline.current_destination())
        };
        let velocity = if spline_finalized {
            leader.speed(select_speed_type(leader.movement_flags))
        } else {
            leader.move_spline.velocity()
        };

        Self {
            position: leader.position,
            orientation: leader.orientation,
            is_creature: leader.is_creature(),
            spline_finalized,
            relative_heading,
            velocity,
            is_moving: leader.is_moving(),
        }
    }
}

/// Destination and speed chosen by one formation launch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationMove {
    pub destination: Vec2,
    pub velocity: f32,
}

#[derive(Debug, Clone)]
pub struct FormationMovementGenerator {
    target: ActorId,
    formation_offset: Vec2,
    movement_timer: i32,
    movement_check_timer: i32,
    last_leader_position: Option<Vec2>,
}

impl FormationMovementGenerator {
    pub fn new(target: ActorId, formation_offset: Vec2) -> Self {
        Self {
            target,
            formation_offset,
            movement_timer: 0,
            movement_check_timer: timer_ms(config().movement_check_interval),
            last_leader_position: None,
        }
    }

    pub fn target(&self) -> ActorId {
        self.target
    }

    pub fn movement_timer(&self) -> i32 {
        self.movement_timer
    }

    pub fn movement_check_timer(&self) -> i32 {
        self.movement_check_timer
    }

    pub fn last_leader_position(&self) -> Option<Vec2> {
        self.last_leader_position
    }

    /// Work out where the follower should head and how fast
    ///
    /// The offset is applied in polar form around the predicted leader
    /// position, rotated by the leader's facing and heading.
    pub fn plan_movement(
        &self,
        owner: &Unit,
        leader: &LeaderMotion,
        collision: &CollisionMap,
        enforce_alignment: bool,
    ) -> FormationMove {
        let config = config();
        let (range, angle) = to_polar(self.formation_offset);
        let mut destination = leader.position;
        let mut velocity = leader.velocity;

        if !leader.spline_finalized || leader.is_moving {
            let travel_distance = if leader.is_creature {
                velocity * config.creature_prediction_seconds
            } else {
                velocity
            };

            // Move the destination ahead of the leader...
            destination = collision.move_position_to_first_collision(
                destination,
                travel_distance,
                leader.relative_heading + leader.orientation,
            );
            // ...then lay the formation shape around it
            destination = collision.move_position_to_first_collision(
                destination,
                range,
                angle + leader.relative_heading + leader.orientation,
            );

            // f32::min discards the NaN of a zero travel distance
            let distance = owner.position.distance(destination);
            let catchup = (distance / travel_distance).min(config.max_catchup_multiplier);
            velocity *= catchup;
        } else if leader.is_creature || enforce_alignment {
            destination = collision.move_position_to_first_collision(
                destination,
                range,
                angle + leader.relative_heading + leader.orientation,
            );
        }
        // A stopped player leader keeps the raw destination

        FormationMove {
            destination,
            velocity,
        }
    }

    /// Launch a path into formation
    pub fn launch_movement(
        &mut self,
        owner: &mut Unit,
        leader: &LeaderMotion,
        collision: &CollisionMap,
        enforce_alignment: bool,
    ) {
        let planned = self.plan_movement(owner, leader, collision, enforce_alignment);

        MoveSplineInit::new()
            .move_to(planned.destination)
            .set_velocity(planned.velocity)
            .launch(owner);

        self.last_leader_position = Some(leader.position);
        owner.add_state(UnitState::ROAMING_MOVE);

        tracing::trace!(
            "Follower {:?} heading to ({:.2}, {:.2}) at {:.2}",
            owner.id,
            planned.destination.x,
            planned.destination.y,
            planned.velocity
        );
    }
}

impl FormationOffsetReceiver for FormationMovementGenerator {
    fn formation_offset(&self) -> Vec2 {
        self.formation_offset
    }

    fn set_formation_offset(&mut self, offset: Vec2) {
        self.formation_offset = offset;
    }
}

impl MovementGenerator for FormationMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Formation
    }

    fn initialize(&mut self, owner: &mut Unit) {
        owner.add_state(UnitState::ROAMING);
    }

    fn update(&mut self, owner: ActorId, ctx: &mut MotionContext<'_>, diff: u32) -> bool {
        let Some(leader) = ctx.units.get(self.target).map(LeaderMotion::capture) else {
            return false;
        };
        let next_movement_time = ctx
            .formations
            .get(&self.target)
            .map(|formation| formation.next_formation_movement_time())
            .unwrap_or(0);
        let collision = ctx.collision;
        let Some(owner) = ctx.units.get_mut(owner) else {
            return false;
        };

        owner.home_position = owner.position;

        if owner.has_state(UnitState::ROAMING_MOVE) && owner.move_spline.finalized() {
            owner.clear_state(UnitState::ROAMING_MOVE);
        }

        // Owner cannot move: reset and wait for the next action
        if owner.cannot_move() {
            self.movement_timer = 0;
            owner.clear_state(UnitState::ROAMING_MOVE);
            owner.stop_moving();
            return true;
        }

        // Creature leader standing still: align once per leader position
        if leader.is_creature && leader.spline_finalized {
            if self.last_leader_position != Some(leader.position) {
                self.launch_movement(owner, &leader, collision, false);
            }
            self.movement_timer = 0;
            return true;
        }

        let step = timer_ms(diff);
        self.movement_check_timer = self.movement_check_timer.saturating_sub(step);
        if self.movement_check_timer < 0 {
            self.movement_check_timer = self
                .movement_check_timer
                .saturating_add(timer_ms(config().movement_check_interval));
        }

        self.movement_timer = self.movement_timer.saturating_sub(step);
        if self.movement_timer <= 0 {
            self.movement_timer = next_movement_time;
            self.launch_movement(owner, &leader, collision, false);
        }

        true
    }

    fn finalize(&mut self, owner: &mut Unit) {
        owner.clear_state(UnitState::ROAMING | UnitState::ROAMING_MOVE);
    }

    fn movement_inform(&mut self, owner: &mut Unit) {
        owner.movement_inform(MovementGeneratorType::Formation, 0);
    }

    fn as_offset_receiver(&mut self) -> Option<&mut dyn FormationOffsetReceiver> {
        Some(self)
    }
}
