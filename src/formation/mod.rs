//! Formation groups: shapes, stored definitions and the coordinator

pub mod coordinator;
pub mod store;
pub mod topology;

pub use coordinator::{AiFormation, FormationFollower};
pub use store::{
    formation_store, set_formation_store, FormationDataSource, FormationMemberData,
    FormationSettings, FormationStore,
};
pub use topology::FormationType;
