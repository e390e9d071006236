//! Deployment configuration for the telemetry agent
//!
//! Endpoint addresses, credentials, destination identifiers, and timing
//! constants are deployment parameters, not runtime knobs. They live in one
//! immutable structure injected at process start; the defaults are the
//! deployment constants, and a TOML file may override them (which is what
//! the tests do to point the agent at fakes).

use crate::protocol::Channel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub sensors: SensorsSection,
    #[serde(default)]
    pub cycle: CycleSection,
    /// Optional plain-TCP pre-check performed before broker bring-up.
    /// Disabled when absent; its only effect is abort-on-failure.
    pub precheck: Option<PrecheckSection>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            device: DeviceSection::default(),
            link: LinkSection::default(),
            mqtt: MqttSection::default(),
            sensors: SensorsSection::default(),
            cycle: CycleSection::default(),
            precheck: None,
        }
    }
}

/// Device section - identity only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSection {
    /// Device identifier (must match [a-zA-Z0-9._-]+); used as the MQTT
    /// client id prefix.
    pub id: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            id: "chirp-agent".to_string(),
        }
    }
}

/// Wireless link section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkSection {
    /// Access point SSID.
    pub ssid: String,
    /// Maximum association status polls before giving up.
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
    /// Fixed interval between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            ssid: "garden".to_string(),
            max_retry: default_max_retry(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl LinkSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// MQTT section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MqttSection {
    /// MQTT broker URL with protocol and port.
    pub broker_url: String,
    /// Environment variable containing username.
    pub username_env: Option<String>,
    /// Environment variable containing password.
    pub password_env: Option<String>,
    /// One topic shared by all readings.
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Maximum connect attempts before giving up.
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://192.168.0.40:1883".to_string(),
            username_env: None,
            password_env: None,
            topic: default_topic(),
            max_retry: default_max_retry(),
        }
    }
}

impl MqttSection {
    /// Broker credentials resolved from the environment. `None` until a
    /// username env var is configured and set; a missing password resolves
    /// to empty rather than blocking the connection attempt.
    pub fn credentials(&self) -> Option<(String, String)> {
        let username = std::env::var(self.username_env.as_ref()?).ok()?;
        let password = self
            .password_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .unwrap_or_default();
        Some((username, password))
    }
}

/// Sensor addressing and Domoticz destination identifiers.
///
/// Each (sensor, measurement-kind) pair has a fixed, unique idx on the
/// Domoticz side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorsSection {
    /// I2C address of sensor A.
    #[serde(default = "default_addr_a")]
    pub addr_a: u8,
    /// I2C address of sensor B.
    #[serde(default = "default_addr_b")]
    pub addr_b: u8,
    pub idx_moisture_a: u16,
    pub idx_moisture_b: u16,
    pub idx_light_a: u16,
    pub idx_light_b: u16,
}

impl Default for SensorsSection {
    fn default() -> Self {
        Self {
            addr_a: default_addr_a(),
            addr_b: default_addr_b(),
            idx_moisture_a: 560,
            idx_moisture_b: 561,
            idx_light_a: 562,
            idx_light_b: 563,
        }
    }
}

impl SensorsSection {
    /// Destination identifier for a channel.
    pub fn idx_for(&self, channel: Channel) -> u16 {
        match channel {
            Channel::MoistureA => self.idx_moisture_a,
            Channel::LightA => self.idx_light_a,
            Channel::MoistureB => self.idx_moisture_b,
            Channel::LightB => self.idx_light_b,
        }
    }
}

/// Cycle timing section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSection {
    /// Target cycle period in seconds. The sleep budget is whatever is
    /// left of this after acquisition and transmission.
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    /// Pause between capacitance and light reads, letting the light
    /// element stabilize, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Pause after a publish or disconnect letting in-flight bytes leave
    /// the device, in milliseconds.
    #[serde(default = "default_flush_wait_ms")]
    pub flush_wait_ms: u64,
    /// Suspension strategy between cycles.
    #[serde(default)]
    pub suspend: SuspendMode,
}

impl Default for CycleSection {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            flush_wait_ms: default_flush_wait_ms(),
            suspend: SuspendMode::default(),
        }
    }
}

impl CycleSection {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn flush_wait(&self) -> Duration {
        Duration::from_millis(self.flush_wait_ms)
    }
}

/// Suspension strategy selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SuspendMode {
    /// Block in-process for the sleep budget, then run the next cycle.
    #[default]
    ActiveWait,
    /// Sleep for the budget, then exit; the platform scheduler relaunches
    /// the process (in-memory state does not survive between cycles).
    DeepSleep,
}

/// Pre-check section: plain stream connect to a fixed host and port, no
/// data exchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrecheckSection {
    pub host: String,
    pub port: u16,
}

fn default_max_retry() -> u32 {
    25
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_topic() -> String {
    "domoticz/in".to_string()
}

fn default_addr_a() -> u8 {
    0x20
}

fn default_addr_b() -> u8 {
    0x21
}

fn default_period_secs() -> u64 {
    300
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_flush_wait_ms() -> u64 {
    100
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid device ID format: {0}")]
    InvalidDeviceId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AgentConfig {
    /// Load configuration from a TOML file, falling back to the built-in
    /// deployment defaults for anything the file omits.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate deployment invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_device_id(&self.device.id)?;

        if self.cycle.period_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "cycle.period_secs must be greater than zero".to_string(),
            ));
        }
        if self.link.max_retry == 0 || self.mqtt.max_retry == 0 {
            return Err(ConfigError::InvalidConfig(
                "retry budgets must allow at least one attempt".to_string(),
            ));
        }

        let idxs = [
            self.sensors.idx_moisture_a,
            self.sensors.idx_light_a,
            self.sensors.idx_moisture_b,
            self.sensors.idx_light_b,
        ];
        for (i, a) in idxs.iter().enumerate() {
            if idxs[i + 1..].contains(a) {
                return Err(ConfigError::InvalidConfig(format!(
                    "destination idx {a} is assigned to more than one channel"
                )));
            }
        }

        Ok(())
    }
}

/// Validate device ID format (MQTT client id charset)
fn validate_device_id(device_id: &str) -> Result<(), ConfigError> {
    let valid_chars = device_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if device_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidDeviceId(format!(
            "Device ID '{device_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_deployment_constants() {
        let config = AgentConfig::default();
        assert_eq!(config.device.id, "chirp-agent");
        assert_eq!(config.mqtt.broker_url, "mqtt://192.168.0.40:1883");
        assert_eq!(config.mqtt.topic, "domoticz/in");
        assert_eq!(config.link.max_retry, 25);
        assert_eq!(config.link.poll_interval_ms, 500);
        assert_eq!(config.cycle.period_secs, 300);
        assert_eq!(config.cycle.settle_delay_ms, 1000);
        assert_eq!(config.sensors.idx_moisture_a, 560);
        assert_eq!(config.sensors.idx_moisture_b, 561);
        assert_eq!(config.sensors.idx_light_a, 562);
        assert_eq!(config.sensors.idx_light_b, 563);
        assert!(config.precheck.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml_round_trip() {
        let toml_content = r#"
[device]
id = "greenhouse-7"

[link]
ssid = "glasshouse"
max_retry = 10
poll_interval_ms = 250

[mqtt]
broker_url = "mqtt://broker.local:1883"
topic = "domoticz/in"
max_retry = 5

[sensors]
idx_moisture_a = 100
idx_moisture_b = 101
idx_light_a = 102
idx_light_b = 103

[cycle]
period_secs = 600
settle_delay_ms = 500
flush_wait_ms = 50
suspend = "deep-sleep"

[precheck]
host = "192.168.0.40"
port = 80
"#;

        let config: AgentConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.device.id, "greenhouse-7");
        assert_eq!(config.link.ssid, "glasshouse");
        assert_eq!(config.mqtt.max_retry, 5);
        assert_eq!(config.cycle.suspend, SuspendMode::DeepSleep);
        let precheck = config.precheck.as_ref().expect("precheck section");
        assert_eq!(precheck.host, "192.168.0.40");
        assert_eq!(precheck.port, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_invalid_device_id() {
        assert!(validate_device_id("invalid@device").is_err());
        assert!(validate_device_id("").is_err());
        assert!(validate_device_id("valid-device_123.test").is_ok());
    }

    #[test]
    fn test_duplicate_idx_rejected() {
        let mut config = AgentConfig::default();
        config.sensors.idx_light_b = config.sensors.idx_moisture_a;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = AgentConfig::default();
        config.cycle.period_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retry_budget_rejected() {
        let mut config = AgentConfig::default();
        config.link.max_retry = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idx_for_channel_mapping() {
        let sensors = SensorsSection::default();
        assert_eq!(sensors.idx_for(Channel::MoistureA), 560);
        assert_eq!(sensors.idx_for(Channel::MoistureB), 561);
        assert_eq!(sensors.idx_for(Channel::LightA), 562);
        assert_eq!(sensors.idx_for(Channel::LightB), 563);
    }

    #[test]
    fn test_mqtt_credentials_from_environment() {
        let mut mqtt = MqttSection::default();
        assert!(mqtt.credentials().is_none(), "no username env configured");

        std::env::set_var("CHIRP_TEST_MQTT_USER", "agent");
        std::env::set_var("CHIRP_TEST_MQTT_PASS", "hunter2");
        mqtt.username_env = Some("CHIRP_TEST_MQTT_USER".to_string());
        mqtt.password_env = Some("CHIRP_TEST_MQTT_PASS".to_string());
        assert_eq!(
            mqtt.credentials(),
            Some(("agent".to_string(), "hunter2".to_string()))
        );

        // A missing password env resolves to empty, not None.
        std::env::remove_var("CHIRP_TEST_MQTT_PASS");
        assert_eq!(
            mqtt.credentials(),
            Some(("agent".to_string(), String::new()))
        );
        std::env::remove_var("CHIRP_TEST_MQTT_USER");
    }

    #[test]
    fn test_duration_accessors() {
        let cycle = CycleSection::default();
        assert_eq!(cycle.period(), Duration::from_secs(300));
        assert_eq!(cycle.settle_delay(), Duration::from_millis(1000));
        assert_eq!(cycle.flush_wait(), Duration::from_millis(100));
        assert_eq!(
            LinkSection::default().poll_interval(),
            Duration::from_millis(500)
        );
    }
}
