//! Link and broker capabilities
//!
//! These traits are the seams between the cycle logic and the radio /
//! pub-sub stacks: the connectivity manager drives them, tests substitute
//! fakes, and production wires [`link::OsManagedLink`] and
//! [`mqtt::MqttBroker`].

use async_trait::async_trait;
use thiserror::Error;

pub mod link;
pub mod mqtt;

pub use mqtt::MqttBroker;

/// Wireless link errors (best-effort surface; teardown never reports).
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("association could not be started: {0}")]
    AssociationFailed(String),
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pub/sub client errors.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker answered the handshake with a non-success code.
    #[error("broker refused connection: {reason}")]
    ConnectRejected { reason: String },
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("not connected")]
    NotConnected,
    #[error("invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
}

/// Wireless radio capability.
///
/// `begin` wakes the radio and starts association with the configured
/// access point; association completes asynchronously and is observed by
/// polling [`WirelessLink::is_connected`].
#[async_trait]
pub trait WirelessLink: Send + Sync {
    /// Wake the radio from low-power mode and begin association using the
    /// deployment credentials. Persistent credential storage stays off.
    async fn begin(&mut self) -> Result<(), LinkError>;

    /// One association status poll.
    async fn is_connected(&self) -> bool;

    /// Disassociate and return the radio to low-power mode. Safe to call
    /// in any state; errors are not surfaced.
    async fn shutdown(&mut self);
}

/// Publish/subscribe client capability.
#[async_trait]
pub trait TelemetryBroker: Send + Sync {
    /// One connect attempt. A broker-side rejection surfaces as
    /// [`BrokerError::ConnectRejected`] with the reason code text.
    async fn connect(&mut self) -> Result<(), BrokerError>;

    /// Publish one message. No acknowledgment wait is available; callers
    /// that need in-flight bytes drained apply their own flush-wait.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Unconditional disconnect. Safe to call in any state.
    async fn disconnect(&mut self);
}
