//! Shared test helpers
//!
//! Builds controllers against mock capabilities with timing shrunk so a
//! full retry exhaustion runs in milliseconds.

use chirp_agent::config::{AgentConfig, CycleSection, LinkSection, MqttSection};
use chirp_agent::connectivity::ConnectivityManager;
use chirp_agent::cycle::CycleController;
use chirp_agent::testing::mocks::{MockBroker, MockLink, MockSensor, RecordingSuspend};

/// Deployment config with millisecond-scale timing and a 3-attempt budget.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        link: LinkSection {
            max_retry: 3,
            poll_interval_ms: 1,
            ..LinkSection::default()
        },
        mqtt: MqttSection {
            max_retry: 3,
            ..MqttSection::default()
        },
        cycle: CycleSection {
            period_secs: 300,
            settle_delay_ms: 1,
            flush_wait_ms: 1,
            ..CycleSection::default()
        },
        ..AgentConfig::default()
    }
}

/// Controller over the given mocks, with sensors fixed at
/// moisture/light = 410/150 (sensor A) and 395/160 (sensor B).
pub fn test_controller(
    link: MockLink,
    broker: MockBroker,
    suspend: RecordingSuspend,
) -> CycleController<MockLink, MockBroker> {
    test_controller_with_sensors(
        test_config(),
        MockSensor::new(410, 150),
        MockSensor::new(395, 160),
        link,
        broker,
        suspend,
    )
}

pub fn test_controller_with_sensors(
    config: AgentConfig,
    sensor_a: MockSensor,
    sensor_b: MockSensor,
    link: MockLink,
    broker: MockBroker,
    suspend: RecordingSuspend,
) -> CycleController<MockLink, MockBroker> {
    let connectivity = ConnectivityManager::new(
        link,
        broker,
        &config.link,
        &config.mqtt,
        config.cycle.flush_wait(),
        config.precheck.clone(),
    );
    CycleController::new(
        config,
        Box::new(sensor_a),
        Box::new(sensor_b),
        connectivity,
        Box::new(suspend),
    )
}
