//! Errors returned by the engine's caller-facing API.

use shelter_logic::agent::AgentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("unknown agent {0}")]
    Unknown(AgentId),
    #[error("agent {0} is dead")]
    Dead(AgentId),
    #[error("agent {0} already exists")]
    Duplicate(AgentId),
    #[error("agent {0} died here and cannot be respawned")]
    Fallen(AgentId),
}

