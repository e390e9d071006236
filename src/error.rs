//! Error types for the telemetry agent
//!
//! Connectivity failures are recovered locally by abandoning the current
//! cycle's transmission; nothing here is fatal to the process. The typed
//! errors exist so capability implementations can propagate cause with
//! `?`, and so the connectivity manager has something meaningful to log
//! before it collapses a failure to its boolean contract.

use thiserror::Error;

use crate::config::ConfigError;
use crate::sensor::SensorError;
use crate::transport::{BrokerError, LinkError};

/// Main error type for agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
