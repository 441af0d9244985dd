//! Per-unit movement: paths, motion slots and the generators that drive them

pub mod flags;
pub mod formation;
pub mod generator;
pub mod motion_master;
pub mod point;
pub mod spline;

pub use flags::{MovementFlags, UnitMoveType, UnitState};
pub use formation::{FormationMove, FormationMovementGenerator, LeaderMotion};
pub use generator::{
    FormationOffsetReceiver, MotionContext, MotionSlot, MovementGenerator, MovementGeneratorType,
};
pub use motion_master::MotionMaster;
pub use point::PointMovementGenerator;
pub use spline::{MoveSpline, MoveSplineInit};
