//! Pre-check connection behavior inside the transmission sequence
//!
//! The pre-check is a plain stream connect performed between link and
//! broker bring-up; its only effect is abort-on-failure. These tests run
//! it against a real loopback listener.

mod test_helpers;

use chirp_agent::config::PrecheckSection;
use chirp_agent::testing::mocks::{MockBroker, MockLink, MockSensor, RecordingSuspend};
use test_helpers::{test_config, test_controller_with_sensors};
use tokio::net::TcpListener;

#[tokio::test]
async fn test_precheck_success_proceeds_to_broker() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = test_config();
    config.precheck = Some(PrecheckSection {
        host: "127.0.0.1".to_string(),
        port,
    });

    let broker = MockBroker::accepting();
    let link = MockLink::connects_after(0);
    let suspend = RecordingSuspend::resuming();
    let mut controller = test_controller_with_sensors(
        config,
        MockSensor::new(410, 150),
        MockSensor::new(395, 160),
        link,
        broker.clone(),
        suspend,
    );

    controller.run_cycle().await;

    assert_eq!(broker.connect_attempts(), 1);
    assert_eq!(broker.published().len(), 4);
}

#[tokio::test]
async fn test_precheck_failure_aborts_before_broker() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut config = test_config();
    config.precheck = Some(PrecheckSection {
        host: "127.0.0.1".to_string(),
        port,
    });

    let broker = MockBroker::accepting();
    let link = MockLink::connects_after(0);
    let suspend = RecordingSuspend::resuming();
    let mut controller = test_controller_with_sensors(
        config,
        MockSensor::new(410, 150),
        MockSensor::new(395, 160),
        link.clone(),
        broker.clone(),
        suspend.clone(),
    );

    controller.run_cycle().await;

    assert_eq!(broker.connect_attempts(), 0, "broker never attempted");
    assert!(broker.published().is_empty());

    // Guaranteed teardown still runs once.
    assert_eq!(broker.disconnect_count(), 1);
    assert_eq!(link.shutdown_count(), 1);
    assert_eq!(suspend.budgets().len(), 1);
}
