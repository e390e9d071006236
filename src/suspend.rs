//! Process suspension between cycles
//!
//! The controller does not care how the gap between cycles is spent, only
//! that it lasts the sleep budget. The two strategies differ in whether
//! in-memory state survives: active-wait blocks and resumes at the
//! caller; the deep-sleep analog sleeps and then asks the caller to halt,
//! leaving the relaunch to the platform scheduler (which is how a
//! hardware deep sleep looks from software - execution restarts at entry).

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// What the caller should do after the suspension elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// State preserved; run the next cycle in-process.
    Resumed,
    /// State discarded; exit and let the platform relaunch the process.
    Halt,
}

/// Suspension capability, selected at process start.
#[async_trait]
pub trait SuspendStrategy: Send + Sync {
    async fn suspend(&self, budget: Duration) -> SuspendOutcome;
}

#[async_trait]
impl SuspendStrategy for Box<dyn SuspendStrategy> {
    async fn suspend(&self, budget: Duration) -> SuspendOutcome {
        (**self).suspend(budget).await
    }
}

/// Cooperative in-process wait; the loop in `main` runs forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActiveWait;

#[async_trait]
impl SuspendStrategy for ActiveWait {
    async fn suspend(&self, budget: Duration) -> SuspendOutcome {
        sleep(budget).await;
        SuspendOutcome::Resumed
    }
}

/// Deep-sleep analog for hosted targets: one cycle per process lifetime.
#[derive(Debug, Default, Clone, Copy)]
pub struct OneShot;

#[async_trait]
impl SuspendStrategy for OneShot {
    async fn suspend(&self, budget: Duration) -> SuspendOutcome {
        sleep(budget).await;
        info!("wake period elapsed, handing off to the platform scheduler");
        SuspendOutcome::Halt
    }
}
