use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Subsystem '{name}' failed to initialize: {reason}")]
    SubsystemInit { name: String, reason: String },

    #[error("Subsystem '{name}' not found")]
    SubsystemNotFound { name: String },

    #[error("Unknown locomotor template '{name}'")]
    UnknownTemplate { name: String },

    #[error("Unit {id} not found")]
    UnitNotFound { id: u32 },

    #[error("Engine has shut down")]
    Quitting,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
