pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, FormationConfig};
pub use error::{FormationError, Result};
pub use types::{ActorId, SpawnId};
