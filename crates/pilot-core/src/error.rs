//! Validation errors shared by every component.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PilotError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid mode: {0} (expected local-ssh or remote-tmux)")]
    InvalidMode(String),

    #[error("mode {0} requires a host")]
    ModeRequiresHost(&'static str),

    #[error("session name is empty after sanitizing")]
    EmptySessionName,

    #[error("no free session name for {base} (tried -2 through -{max})")]
    CollisionExhausted { base: String, max: u32 },

    #[error("invalid target: {0:?}")]
    InvalidTarget(String),

    #[error("invalid host: {0:?} (must not start with '-')")]
    InvalidHost(String),
}

impl PilotError {
    /// Short machine-readable kind, used for structured CLI errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CollisionExhausted { .. } => "collision",
            _ => "validation",
        }
    }
}
