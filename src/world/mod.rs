//! Units, obstacles and the tick that drives them

pub mod collision;
pub mod unit;
#[allow(clippy::module_inception)]
pub mod world;

pub use collision::CollisionMap;
pub use unit::{Unit, UnitAi, UnitKind};
pub use world::{FormationRegistry, Units, World};
