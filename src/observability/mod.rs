//! Observability infrastructure
//!
//! The agent's only user-facing surface is its log stream; production
//! deployments typically run it at WARN or silence it entirely.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
