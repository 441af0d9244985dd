//! Move to a fixed point, then hand control back

use glam::Vec2;

use crate::core::types::ActorId;
use crate::movement::generator::{MotionContext, MovementGenerator, MovementGeneratorType};
use crate::movement::spline::MoveSplineInit;
use crate::world::unit::Unit;

const ARRIVAL_DISTANCE: f32 = 1e-3;

#[derive(Debug, Clone)]
pub struct PointMovementGenerator {
    id: u32,
    destination: Vec2,
    speed: Option<f32>,
    launched: bool,
    arrived: bool,
}

impl PointMovementGenerator {
    pub fn new(id: u32, destination: Vec2) -> Self {
        Self {
            id,
            destination,
            speed: None,
            launched: false,
            arrived: false,
        }
    }

    /// Travel at a fixed speed instead of the owner's current speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    fn launch(&mut self, owner: &mut Unit) {
        let mut init = MoveSplineInit::new().move_to(self.destination);
        if let Some(speed) = self.speed {
            init = init.set_velocity(speed);
        }
        init.launch(owner);
        self.launched = true;
    }
}

impl MovementGenerator for PointMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Point
    }

    fn initialize(&mut self, owner: &mut Unit) {
        self.launched = false;
        self.arrived = false;
        if !owner.cannot_move() {
            self.launch(owner);
        }
    }

    fn update(&mut self, owner: ActorId, ctx: &mut MotionContext<'_>, _diff: u32) -> bool {
        let Some(owner) = ctx.units.get_mut(owner) else {
            return false;
        };

        if self.arrived {
            return false;
        }

        if owner.cannot_move() {
            if !owner.move_spline.finalized() {
                owner.stop_moving();
            }
            self.launched = false;
            return true;
        }

        if !self.launched {
            self.launch(owner);
            return true;
        }

        // Path ended without an arrival notification: stopped from outside,
        // or the owner was already standing on the destination
        if owner.move_spline.finalized() {
            if owner.position.distance(self.destination) <= ARRIVAL_DISTANCE {
                self.arrived = true;
                owner.movement_inform(MovementGeneratorType::Point, self.id);
                return false;
            }
            self.launch(owner);
        }

        true
    }

    fn finalize(&mut self, _owner: &mut Unit) {}

    fn movement_inform(&mut self, owner: &mut Unit) {
        self.arrived = true;
        owner.movement_inform(MovementGeneratorType::Point, self.id);
    }
}
