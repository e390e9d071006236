//! Reading formatter/sender
//!
//! One reading becomes one Domoticz envelope on the shared topic. A
//! successful publish is followed by a fixed flush-wait - the transport
//! offers no acknowledgment to wait on, and tearing the connection down
//! with bytes still in flight loses the message. A failed publish is
//! logged and the cycle moves on to the next reading; there is no
//! per-message retry.

use crate::protocol::{Reading, TelemetryMessage};
use crate::transport::TelemetryBroker;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Serialize `reading` for destination `idx` and publish it. Called only
/// once link and broker are both up.
pub async fn send_reading<B: TelemetryBroker>(
    broker: &mut B,
    topic: &str,
    idx: u16,
    reading: Reading,
    flush_wait: Duration,
) {
    let message = TelemetryMessage::new(idx, reading.value);
    let payload = match serde_json::to_vec(&message) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, idx, "failed to serialize reading");
            return;
        }
    };

    debug!(topic, idx, channel = ?reading.channel, value = reading.value, "publishing reading");

    match broker.publish(topic, &payload).await {
        Ok(()) => sleep(flush_wait).await,
        Err(e) => {
            warn!(error = %e, idx, channel = ?reading.channel, "reading publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Channel;
    use crate::testing::mocks::MockBroker;

    #[tokio::test]
    async fn test_send_reading_publishes_envelope() {
        let mut broker = MockBroker::accepting();
        let reading = Reading {
            channel: Channel::MoistureA,
            value: 417,
        };

        send_reading(&mut broker, "domoticz/in", 560, reading, Duration::ZERO).await;

        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "domoticz/in");
        assert_eq!(
            String::from_utf8(published[0].1.clone()).unwrap(),
            r#"{"idx":560,"nvalue":0,"svalue":"417"}"#
        );
    }

    #[tokio::test]
    async fn test_send_reading_failure_is_not_escalated() {
        let mut broker = MockBroker::accepting();
        broker.fail_publish_at(0);
        let reading = Reading {
            channel: Channel::LightA,
            value: 9,
        };

        send_reading(&mut broker, "domoticz/in", 562, reading, Duration::ZERO).await;
        assert!(broker.published().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_publish_is_followed_by_flush_wait() {
        let mut broker = MockBroker::accepting();
        let reading = Reading {
            channel: Channel::MoistureB,
            value: 12,
        };

        let start = tokio::time::Instant::now();
        send_reading(
            &mut broker,
            "domoticz/in",
            561,
            reading,
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(broker.published().len(), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_publish_returns_without_flush_wait() {
        let mut broker = MockBroker::accepting();
        broker.fail_publish_at(0);
        let reading = Reading {
            channel: Channel::MoistureB,
            value: 12,
        };

        let start = tokio::time::Instant::now();
        send_reading(
            &mut broker,
            "domoticz/in",
            561,
            reading,
            Duration::from_millis(100),
        )
        .await;

        assert!(broker.published().is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
