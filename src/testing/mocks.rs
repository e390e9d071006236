//! Mock implementations for testing
//!
//! Mock sensor, link, broker, and suspend capabilities. All recorded
//! state sits behind shared handles, so a test can keep a clone of a mock,
//! hand the original to the controller, and inspect what happened through
//! the clone.

use crate::sensor::{SensorError, SoilSensor};
use crate::suspend::{SuspendOutcome, SuspendStrategy};
use crate::transport::{BrokerError, LinkError, TelemetryBroker, WirelessLink};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type PublishedMessage = (String, Vec<u8>);

/// Mock soil sensor with fixed values.
#[derive(Debug, Clone)]
pub struct MockSensor {
    moisture: u32,
    light: u32,
    should_fail: bool,
    reads: Arc<AtomicU32>,
}

impl MockSensor {
    pub fn new(moisture: u32, light: u32) -> Self {
        Self {
            moisture,
            light,
            should_fail: false,
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::new(0, 0)
        }
    }

    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SoilSensor for MockSensor {
    async fn read_moisture(&mut self) -> Result<u32, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(SensorError::NotResponding(0x20));
        }
        Ok(self.moisture)
    }

    async fn read_light(&mut self) -> Result<u32, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(SensorError::NotResponding(0x20));
        }
        Ok(self.light)
    }
}

/// Mock wireless link with a scripted association delay.
#[derive(Debug, Clone)]
pub struct MockLink {
    /// Status polls that report not-connected before the link comes up.
    polls_before_up: u32,
    begin_fails: bool,
    polls: Arc<AtomicU32>,
    begins: Arc<AtomicU32>,
    shutdowns: Arc<AtomicU32>,
}

impl MockLink {
    /// Link that reports connected after `polls_before_up` failed polls.
    pub fn connects_after(polls_before_up: u32) -> Self {
        Self {
            polls_before_up,
            begin_fails: false,
            polls: Arc::new(AtomicU32::new(0)),
            begins: Arc::new(AtomicU32::new(0)),
            shutdowns: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Link that never reports connected.
    pub fn never_connects() -> Self {
        Self::connects_after(u32::MAX)
    }

    /// Link whose association cannot even be started.
    pub fn begin_fails() -> Self {
        Self {
            begin_fails: true,
            ..Self::connects_after(0)
        }
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn begin_count(&self) -> u32 {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn shutdown_count(&self) -> u32 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WirelessLink for MockLink {
    async fn begin(&mut self) -> Result<(), LinkError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        if self.begin_fails {
            return Err(LinkError::AssociationFailed("mock begin failure".to_string()));
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        poll >= self.polls_before_up
    }

    async fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mock broker recording published messages.
#[derive(Debug, Clone)]
pub struct MockBroker {
    /// Connect attempts rejected before the broker accepts.
    rejects_before_accept: u32,
    connects: Arc<AtomicU32>,
    disconnects: Arc<AtomicU32>,
    publish_calls: Arc<AtomicU32>,
    failing_publishes: Arc<Mutex<HashSet<u32>>>,
    published: Arc<Mutex<Vec<PublishedMessage>>>,
}

impl MockBroker {
    /// Broker that accepts on the first attempt.
    pub fn accepting() -> Self {
        Self::accepts_after(0)
    }

    /// Broker that rejects `rejects_before_accept` attempts, then accepts.
    pub fn accepts_after(rejects_before_accept: u32) -> Self {
        Self {
            rejects_before_accept,
            connects: Arc::new(AtomicU32::new(0)),
            disconnects: Arc::new(AtomicU32::new(0)),
            publish_calls: Arc::new(AtomicU32::new(0)),
            failing_publishes: Arc::new(Mutex::new(HashSet::new())),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Broker that never accepts a connection.
    pub fn never_accepts() -> Self {
        Self::accepts_after(u32::MAX)
    }

    /// Make the `index`-th publish call (zero-based) fail.
    pub fn fail_publish_at(&self, index: u32) {
        self.failing_publishes.lock().unwrap().insert(index);
    }

    /// Successfully published messages, in order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> u32 {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn publish_attempts(&self) -> u32 {
        self.publish_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetryBroker for MockBroker {
    async fn connect(&mut self) -> Result<(), BrokerError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
        if attempt < self.rejects_before_accept {
            return Err(BrokerError::ConnectRejected {
                reason: "NotAuthorized".to_string(),
            });
        }
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let call = self.publish_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_publishes.lock().unwrap().contains(&call) {
            return Err(BrokerError::PublishFailed("mock publish failure".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Suspend strategy that records the budget instead of sleeping.
#[derive(Debug, Clone)]
pub struct RecordingSuspend {
    outcome: SuspendOutcome,
    budgets: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSuspend {
    pub fn resuming() -> Self {
        Self {
            outcome: SuspendOutcome::Resumed,
            budgets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn halting() -> Self {
        Self {
            outcome: SuspendOutcome::Halt,
            ..Self::resuming()
        }
    }

    /// Budgets passed to `suspend`, in order.
    pub fn budgets(&self) -> Vec<Duration> {
        self.budgets.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuspendStrategy for RecordingSuspend {
    async fn suspend(&self, budget: Duration) -> SuspendOutcome {
        self.budgets.lock().unwrap().push(budget);
        self.outcome
    }
}
