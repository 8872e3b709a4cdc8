//! Errors raised by the simulation host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("ticks_per_second must be between 1 and {max}, got {got}")]
    TickRate { got: u32, max: u32 },

    #[error("unknown mob type: {0}")]
    UnknownMob(String),

    #[error(transparent)]
    Ai(#[from] mob_ai::AiError),
}

pub type SimResult<T> = Result<T, SimError>;
