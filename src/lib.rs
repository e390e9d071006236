//! Chirp Agent - soil telemetry over MQTT
//!
//! A periodic telemetry agent for a pair of Chirp soil-moisture/light
//! sensors. Each cycle it acquires four readings (moisture and light from
//! two sensors), brings up the wireless link and the MQTT broker
//! connection with bounded fixed-interval retry, publishes one Domoticz
//! message per reading, tears everything down, and suspends for whatever
//! is left of the cycle period.
//!
//! # Overview
//!
//! This crate provides:
//! - The cycle controller (acquire → transmit → sleep-budget → suspend)
//! - A connectivity manager with bounded retry for link and broker bring-up
//! - The Domoticz wire message types
//! - Capability traits for sensors, link, broker, and suspension, so the
//!   controller runs against fakes in tests and against rumqttc in production
//!
//! # Quick Start
//!
//! ```rust
//! use chirp_agent::protocol::{Channel, CycleReadings, TelemetryMessage};
//!
//! let readings = CycleReadings {
//!     moisture_a: 412,
//!     light_a: 188,
//!     moisture_b: 397,
//!     light_b: 201,
//! };
//!
//! // Readings are transmitted in a fixed order, one message per reading.
//! let order: Vec<Channel> = readings.in_send_order().iter().map(|r| r.channel).collect();
//! assert_eq!(
//!     order,
//!     vec![Channel::MoistureA, Channel::LightA, Channel::MoistureB, Channel::LightB]
//! );
//!
//! let message = TelemetryMessage::new(560, 412);
//! assert_eq!(
//!     serde_json::to_string(&message).unwrap(),
//!     r#"{"idx":560,"nvalue":0,"svalue":"412"}"#
//! );
//! ```

pub mod config;
pub mod connectivity;
pub mod cycle;
pub mod error;
pub mod observability;
pub mod protocol;
pub mod retry;
pub mod sensor;
pub mod suspend;
pub mod testing;
pub mod transport;

pub use config::AgentConfig;
pub use connectivity::{ConnectionState, ConnectivityManager};
pub use cycle::CycleController;
pub use error::{AgentError, AgentResult};
pub use protocol::{Channel, CycleReadings, Reading, TelemetryMessage};
pub use retry::RetryPolicy;
pub use sensor::SoilSensor;
pub use suspend::{SuspendOutcome, SuspendStrategy};
pub use transport::{TelemetryBroker, WirelessLink};
