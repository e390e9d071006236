//! Soil sensor capability
//!
//! Abstracts the Chirp capacitance/light sensor so the cycle controller
//! never touches a peripheral bus directly. Production wires a bus-backed
//! implementation per sensor address; tests wire `MockSensor`.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Sensor read errors
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    ReadFailed(String),
    #[error("sensor not responding at address {0:#04x}")]
    NotResponding(u8),
}

/// Capability exposed by one soil sensor.
#[async_trait]
pub trait SoilSensor: Send + Sync {
    /// Capacitance-derived soil moisture value.
    async fn read_moisture(&mut self) -> Result<u32, SensorError>;

    /// Ambient light value. Callers are expected to have let the light
    /// element settle since the previous bus transaction.
    async fn read_light(&mut self) -> Result<u32, SensorError>;
}

/// Stand-in sensor for hosted builds: answers with fixed register values
/// so the rest of the agent can run against a real broker without the
/// I2C peripheral present.
#[derive(Debug, Clone)]
pub struct StubSensor {
    addr: u8,
    moisture: u32,
    light: u32,
}

impl StubSensor {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            moisture: 400,
            light: 200,
        }
    }
}

#[async_trait]
impl SoilSensor for StubSensor {
    async fn read_moisture(&mut self) -> Result<u32, SensorError> {
        debug!(addr = self.addr, value = self.moisture, "stub moisture read");
        Ok(self.moisture)
    }

    async fn read_light(&mut self) -> Result<u32, SensorError> {
        debug!(addr = self.addr, value = self.light, "stub light read");
        Ok(self.light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_sensor_reads() {
        let mut sensor = StubSensor::new(0x20);
        assert_eq!(sensor.read_moisture().await.unwrap(), 400);
        assert_eq!(sensor.read_light().await.unwrap(), 200);
    }
}
