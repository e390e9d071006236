//! Connectivity manager
//!
//! Brings the wireless link and the broker connection up and down with a
//! bounded, fixed-interval retry budget. Bring-up reports success as a
//! bool; the cause of a failure is logged here and goes no further,
//! because the only caller-visible consequence is "this cycle's
//! transmission is abandoned". Teardown is best-effort and safe to call
//! whatever state the resource is in.

use crate::config::{LinkSection, MqttSection, PrecheckSection};
use crate::retry::RetryPolicy;
use crate::transport::{TelemetryBroker, WirelessLink};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const PRECHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Bring-up state of one connectivity resource. The link must be `Up`
/// before any broker attempt is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Down,
    Connecting,
    Up,
    Failed,
}

/// Owns the link and broker handles for the duration of one transmission
/// sequence, plus the optional pre-check stream.
pub struct ConnectivityManager<L, B>
where
    L: WirelessLink,
    B: TelemetryBroker,
{
    link: L,
    broker: B,
    link_state: ConnectionState,
    broker_state: ConnectionState,
    link_retry: RetryPolicy,
    broker_retry: RetryPolicy,
    flush_wait: Duration,
    precheck: Option<PrecheckSection>,
    precheck_stream: Option<TcpStream>,
}

impl<L, B> ConnectivityManager<L, B>
where
    L: WirelessLink,
    B: TelemetryBroker,
{
    pub fn new(
        link: L,
        broker: B,
        link_config: &LinkSection,
        mqtt_config: &MqttSection,
        flush_wait: Duration,
        precheck: Option<PrecheckSection>,
    ) -> Self {
        Self {
            link,
            broker,
            link_state: ConnectionState::Down,
            broker_state: ConnectionState::Down,
            link_retry: RetryPolicy::new(link_config.max_retry, link_config.poll_interval()),
            broker_retry: RetryPolicy::new(mqtt_config.max_retry, Duration::ZERO),
            flush_wait,
            precheck,
            precheck_stream: None,
        }
    }

    /// Bring the wireless link up: wake the radio, begin association, then
    /// poll status at a fixed interval until it reports connected or the
    /// retry budget runs out. Returns true on the first observed
    /// connected status.
    pub async fn connect_link(&mut self) -> bool {
        info!("link bring-up");
        self.link_state = ConnectionState::Connecting;

        if let Err(e) = self.link.begin().await {
            warn!(error = %e, "link association could not be started");
            self.link_state = ConnectionState::Failed;
            return false;
        }

        let up = self
            .link_retry
            .run(&mut self.link, |link| {
                Box::pin(async move { link.is_connected().await })
            })
            .await;

        if up {
            info!("link up");
            self.link_state = ConnectionState::Up;
        } else {
            warn!("link did not come up within the retry budget");
            self.link_state = ConnectionState::Failed;
        }
        up
    }

    /// Tear the link down: flush and close the pre-check stream if one is
    /// open, disassociate, and return the radio to low-power mode.
    /// Best-effort; always safe to call.
    pub async fn disconnect_link(&mut self) {
        if let Some(mut stream) = self.precheck_stream.take() {
            let _ = stream.shutdown().await;
        }
        self.link.shutdown().await;
        self.link_state = ConnectionState::Down;
        debug!("link down");
    }

    /// Optional plain stream connection to a fixed host and port before
    /// broker bring-up. No data is exchanged; the stream is held open and
    /// closed during link teardown. Vacuously true when not configured.
    pub async fn precheck(&mut self) -> bool {
        let Some(target) = self.precheck.clone() else {
            return true;
        };

        debug!(host = %target.host, port = target.port, "pre-check connection");
        match tokio::time::timeout(
            PRECHECK_TIMEOUT,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await
        {
            Ok(Ok(stream)) => {
                self.precheck_stream = Some(stream);
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, host = %target.host, "pre-check connection failed");
                false
            }
            Err(_) => {
                warn!(host = %target.host, "pre-check connection timed out");
                false
            }
        }
    }

    /// Bring the broker connection up with bounded retry. Each failed
    /// attempt tears the client down (disconnect plus flush-wait) before
    /// the next try; the last failure is logged for diagnostics only.
    pub async fn connect_broker(&mut self) -> bool {
        info!("broker bring-up");
        self.broker_state = ConnectionState::Connecting;

        let flush_wait = self.flush_wait;
        let up = self
            .broker_retry
            .run(&mut self.broker, move |broker| {
                Box::pin(async move {
                    match broker.connect().await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(error = %e, "broker connect attempt failed");
                            broker.disconnect().await;
                            sleep(flush_wait).await;
                            false
                        }
                    }
                })
            })
            .await;

        if up {
            info!("broker connected");
            self.broker_state = ConnectionState::Up;
        } else {
            warn!("broker did not accept within the retry budget");
            self.broker_state = ConnectionState::Failed;
        }
        up
    }

    /// Unconditional broker disconnect followed by a fixed flush-wait so
    /// pending sends can leave before the link goes away. Always safe to
    /// call.
    pub async fn disconnect_broker(&mut self) {
        self.broker.disconnect().await;
        sleep(self.flush_wait).await;
        self.broker_state = ConnectionState::Down;
        debug!("broker down");
    }

    pub fn link_state(&self) -> ConnectionState {
        self.link_state
    }

    pub fn broker_state(&self) -> ConnectionState {
        self.broker_state
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }
}
