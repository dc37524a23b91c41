use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Periodic status refresh.
///
/// The first tick fires as soon as the scheduler is armed. The session awaits
/// [`PollingScheduler::tick`] on its own task, so a refresh never overlaps
/// another one; ticks missed while a refresh runs are skipped, not queued.
#[derive(Debug, Default)]
pub struct PollingScheduler {
    interval: Option<Interval>,
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, replacing any previous schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, period: Duration) {
        self.disarm();
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    pub fn is_armed(&self) -> bool {
        self.interval.is_some()
    }

    /// Completes at the next scheduled tick; never completes while disarmed
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}
