//! rumqttc-backed broker client
//!
//! Thin adapter from the [`TelemetryBroker`] capability to rumqttc's MQTT
//! v5 client. A connect attempt is only reported successful once the
//! broker's ConnAck arrives with a success code; after that a background
//! task keeps the event loop turning so pings and publish acks are
//! serviced until disconnect.

use crate::config::MqttSection;
use crate::transport::{BrokerError, TelemetryBroker};
use async_trait::async_trait;
use rumqttc::v5::mqttbytes::v5::{ConnectReturnCode, Packet};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{AsyncClient, Event, EventLoop, MqttOptions};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host, port and TLS flag parsed out of a broker URL.
fn parse_broker_endpoint(broker_url: &str) -> Result<(String, u16, bool), BrokerError> {
    let url =
        Url::parse(broker_url).map_err(|_| BrokerError::InvalidBrokerUrl(broker_url.to_string()))?;

    let host = url
        .host_str()
        .ok_or_else(|| BrokerError::InvalidBrokerUrl(broker_url.to_string()))?
        .to_string();
    let tls = url.scheme() == "mqtts";
    let port = url.port().unwrap_or(if tls { 8883 } else { 1883 });

    Ok((host, port, tls))
}

/// Build MQTT options from the deployment config.
///
/// The client id carries a timestamp so a crashed-and-relaunched agent
/// never collides with its own stale session on the broker.
pub fn configure_mqtt_options(
    device_id: &str,
    config: &MqttSection,
) -> Result<MqttOptions, BrokerError> {
    let (host, port, tls) = parse_broker_endpoint(&config.broker_url)?;

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let client_id = format!("{device_id}-{timestamp}");
    let mut mqtt_options = MqttOptions::new(client_id, host, port);

    if tls {
        mqtt_options.set_transport(rumqttc::Transport::tls_with_default_config());
    }

    if let Some((username, password)) = config.credentials() {
        mqtt_options.set_credentials(username, password);
    }

    mqtt_options.set_keep_alive(Duration::from_secs(60));
    Ok(mqtt_options)
}

/// MQTT v5 implementation of the broker capability.
///
/// ```no_run
/// use chirp_agent::config::MqttSection;
/// use chirp_agent::transport::{MqttBroker, TelemetryBroker};
///
/// tokio_test::block_on(async {
///     let mut broker = MqttBroker::new("chirp-agent", MqttSection::default());
///     broker.connect().await.unwrap();
///     broker
///         .publish("domoticz/in", br#"{"idx":560,"nvalue":0,"svalue":"400"}"#)
///         .await
///         .unwrap();
///     broker.disconnect().await;
/// });
/// ```
pub struct MqttBroker {
    device_id: String,
    config: MqttSection,
    client: Option<AsyncClient>,
    event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttBroker {
    pub fn new(device_id: &str, config: MqttSection) -> Self {
        Self {
            device_id: device_id.to_string(),
            config,
            client: None,
            event_loop_handle: None,
        }
    }

    /// Drive the event loop until the broker answers the connect
    /// handshake, then return it for the background task.
    async fn await_connack(mut event_loop: EventLoop) -> Result<EventLoop, BrokerError> {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        return Ok(event_loop);
                    }
                    return Err(BrokerError::ConnectRejected {
                        reason: format!("{:?}", ack.code),
                    });
                }
                Ok(_) => continue,
                Err(e) => return Err(BrokerError::ConnectionFailed(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl TelemetryBroker for MqttBroker {
    async fn connect(&mut self) -> Result<(), BrokerError> {
        let options = configure_mqtt_options(&self.device_id, &self.config)?;
        let (client, event_loop) = AsyncClient::new(options, 10);

        let event_loop = tokio::time::timeout(CONNECT_TIMEOUT, Self::await_connack(event_loop))
            .await
            .map_err(|_| {
                BrokerError::ConnectionFailed("no ConnAck within connect timeout".to_string())
            })??;

        debug!(broker_url = %self.config.broker_url, "broker connected");

        // Keep the event loop turning so pings and acks are serviced
        // until disconnect.
        let handle = tokio::spawn(async move {
            let mut event_loop = event_loop;
            loop {
                match event_loop.poll().await {
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(error = %e, "broker event loop stopped");
                        break;
                    }
                }
            }
        });

        self.client = Some(client);
        self.event_loop_handle = Some(handle);
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let client = self.client.as_ref().ok_or(BrokerError::NotConnected)?;
        client
            .publish(topic, QoS::AtLeastOnce, false, payload.to_vec())
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect().await {
                warn!(error = %e, "broker disconnect request failed");
            }
        }
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for MqttBroker {
    fn drop(&mut self) {
        if let Some(handle) = self.event_loop_handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mqtt_section() -> MqttSection {
        MqttSection {
            broker_url: "mqtt://localhost:1883".to_string(),
            ..MqttSection::default()
        }
    }

    #[test]
    fn test_configure_mqtt_options() {
        let options = configure_mqtt_options("chirp-agent", &test_mqtt_section());
        assert!(options.is_ok());
    }

    #[test]
    fn test_default_ports_by_scheme() {
        let (host, port, tls) = parse_broker_endpoint("mqtt://broker.local").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 1883);
        assert!(!tls);

        let (_, port, tls) = parse_broker_endpoint("mqtts://broker.local").unwrap();
        assert_eq!(port, 8883);
        assert!(tls);

        let (_, port, _) = parse_broker_endpoint("mqtt://192.168.0.40:2883").unwrap();
        assert_eq!(port, 2883);
    }

    #[test]
    fn test_invalid_broker_url() {
        let mut config = test_mqtt_section();
        config.broker_url = "not a url".to_string();
        let result = configure_mqtt_options("chirp-agent", &config);
        assert!(matches!(result, Err(BrokerError::InvalidBrokerUrl(_))));
    }

    #[tokio::test]
    async fn test_publish_before_connect_is_rejected() {
        let mut broker = MqttBroker::new("chirp-agent", test_mqtt_section());
        let result = broker.publish("domoticz/in", b"{}").await;
        assert!(matches!(result, Err(BrokerError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_safe() {
        let mut broker = MqttBroker::new("chirp-agent", test_mqtt_section());
        broker.disconnect().await;
        broker.disconnect().await;
    }
}
