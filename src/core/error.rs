use thiserror::Error;

use crate::core::types::ActorId;

#[derive(Error, Debug)]
pub enum FormationError {
    #[error("Unit not found: {0:?}")]
    UnitNotFound(ActorId),

    #[error("Unit cannot follow itself: {0:?}")]
    SelfFollow(ActorId),

    #[error("Unknown formation type: {0}")]
    UnknownFormationType(u8),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FormationError>;
