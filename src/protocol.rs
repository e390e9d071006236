//! Wire message types for the Domoticz MQTT input topic
//!
//! One message per reading, all on the same topic. Domoticz matches the
//! `idx` field to a virtual device, ignores `nvalue` for these device
//! types, and parses the numeric value out of `svalue`.

use serde::{Deserialize, Serialize};

/// One of the four (sensor, measurement-kind) channels read each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    MoistureA,
    LightA,
    MoistureB,
    LightB,
}

impl Channel {
    /// Fixed transmission order: moisture-A, light-A, moisture-B, light-B.
    pub const SEND_ORDER: [Channel; 4] = [
        Channel::MoistureA,
        Channel::LightA,
        Channel::MoistureB,
        Channel::LightB,
    ];
}

/// A single captured sensor value. Created fresh each cycle, immutable
/// once captured, discarded after transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub channel: Channel,
    pub value: u32,
}

/// The four readings of one wake episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReadings {
    pub moisture_a: u32,
    pub light_a: u32,
    pub moisture_b: u32,
    pub light_b: u32,
}

impl CycleReadings {
    /// Readings in the fixed transmission order.
    pub fn in_send_order(&self) -> [Reading; 4] {
        Channel::SEND_ORDER.map(|channel| Reading {
            channel,
            value: self.value_for(channel),
        })
    }

    fn value_for(&self, channel: Channel) -> u32 {
        match channel {
            Channel::MoistureA => self.moisture_a,
            Channel::LightA => self.light_a,
            Channel::MoistureB => self.moisture_b,
            Channel::LightB => self.light_b,
        }
    }
}

/// Domoticz MQTT envelope: `{"idx": <u16>, "nvalue": 0, "svalue": "<value>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelemetryMessage {
    pub idx: u16,
    pub nvalue: u8,
    pub svalue: String,
}

impl TelemetryMessage {
    /// Build the envelope for a reading bound for destination `idx`.
    /// The numeric value is rendered as a base-10 string per the Domoticz
    /// input contract.
    pub fn new(idx: u16, value: u32) -> Self {
        Self {
            idx,
            nvalue: 0,
            svalue: value.to_string(),
        }
    }
}
