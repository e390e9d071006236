//! Cycle controller
//!
//! One `run_cycle` call is one full wake episode: start the elapsed-time
//! counter, acquire the four readings, run the transmission sequence,
//! compute what is left of the cycle period, and suspend for it. Nothing
//! inside transmission can keep the controller from reaching suspend -
//! a failed stage abandons the rest of the transmission sub-sequence
//! only, and an overrun of the period just clamps the sleep to zero.

use crate::config::AgentConfig;
use crate::connectivity::ConnectivityManager;
use crate::cycle::sender::send_reading;
use crate::error::AgentResult;
use crate::protocol::CycleReadings;
use crate::sensor::SoilSensor;
use crate::suspend::{SuspendOutcome, SuspendStrategy};
use crate::transport::{TelemetryBroker, WirelessLink};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Remaining sleep budget after `elapsed` of a `period`-long cycle.
/// Never negative; zero when transmission overran the period.
pub fn sleep_budget(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Orchestrates one acquire-transmit-sleep cycle per call.
pub struct CycleController<L, B>
where
    L: WirelessLink,
    B: TelemetryBroker,
{
    config: AgentConfig,
    sensor_a: Box<dyn SoilSensor>,
    sensor_b: Box<dyn SoilSensor>,
    connectivity: ConnectivityManager<L, B>,
    suspend: Box<dyn SuspendStrategy>,
}

impl<L, B> CycleController<L, B>
where
    L: WirelessLink,
    B: TelemetryBroker,
{
    pub fn new(
        config: AgentConfig,
        sensor_a: Box<dyn SoilSensor>,
        sensor_b: Box<dyn SoilSensor>,
        connectivity: ConnectivityManager<L, B>,
        suspend: Box<dyn SuspendStrategy>,
    ) -> Self {
        Self {
            config,
            sensor_a,
            sensor_b,
            connectivity,
            suspend,
        }
    }

    /// One full sense → send → sleep sequence. Returns what the suspend
    /// strategy asks the caller to do next.
    pub async fn run_cycle(&mut self) -> SuspendOutcome {
        let timer = Instant::now();

        match self.acquire().await {
            Ok(readings) => self.transmit(&readings).await,
            Err(e) => warn!(error = %e, "sensor acquisition failed, skipping transmission"),
        }

        let elapsed = timer.elapsed();
        let budget = sleep_budget(self.config.cycle.period(), elapsed);
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            sleep_ms = budget.as_millis() as u64,
            "cycle complete, suspending"
        );
        self.suspend.suspend(budget).await
    }

    /// Read both capacitance values, let the light elements settle, then
    /// read both light values. Readings live only for this cycle.
    async fn acquire(&mut self) -> AgentResult<CycleReadings> {
        let moisture_a = self.sensor_a.read_moisture().await?;
        let moisture_b = self.sensor_b.read_moisture().await?;

        sleep(self.config.cycle.settle_delay()).await;

        let light_a = self.sensor_a.read_light().await?;
        let light_b = self.sensor_b.read_light().await?;

        debug!(moisture_a, light_a, moisture_b, light_b, "readings acquired");

        Ok(CycleReadings {
            moisture_a,
            light_a,
            moisture_b,
            light_b,
        })
    }

    /// The transmission sequence, with guaranteed teardown: broker then
    /// link come down exactly once on every exit path, however far the
    /// stages progressed.
    async fn transmit(&mut self, readings: &CycleReadings) {
        self.transmit_stages(readings).await;
        self.connectivity.disconnect_broker().await;
        self.connectivity.disconnect_link().await;
    }

    /// Stages in order; each failure abandons the remainder.
    async fn transmit_stages(&mut self, readings: &CycleReadings) {
        if !self.connectivity.connect_link().await {
            return;
        }
        if !self.connectivity.precheck().await {
            return;
        }
        if !self.connectivity.connect_broker().await {
            return;
        }

        let topic = self.config.mqtt.topic.clone();
        let flush_wait = self.config.cycle.flush_wait();
        for reading in readings.in_send_order() {
            let idx = self.config.sensors.idx_for(reading.channel);
            send_reading(
                self.connectivity.broker_mut(),
                &topic,
                idx,
                reading,
                flush_wait,
            )
            .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sleep_budget_clamps_to_zero() {
        let period = Duration::from_secs(300);
        assert_eq!(
            sleep_budget(period, Duration::from_secs(400)),
            Duration::ZERO
        );
        assert_eq!(sleep_budget(period, period), Duration::ZERO);
        assert_eq!(
            sleep_budget(period, Duration::from_secs(10)),
            Duration::from_secs(290)
        );
    }

    proptest! {
        #[test]
        fn prop_sleep_budget_never_exceeds_period(period_ms in 0u64..1_000_000, elapsed_ms in 0u64..1_000_000) {
            let period = Duration::from_millis(period_ms);
            let elapsed = Duration::from_millis(elapsed_ms);
            let budget = sleep_budget(period, elapsed);
            prop_assert!(budget <= period);
            if elapsed_ms >= period_ms {
                prop_assert_eq!(budget, Duration::ZERO);
            } else {
                prop_assert_eq!(budget, Duration::from_millis(period_ms - elapsed_ms));
            }
        }
    }
}
