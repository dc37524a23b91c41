use chrono::{DateTime, Duration, Utc};

/// Start of the elapsed timer, with inactive stretches cut out.
///
/// While Xcode is inactive the moment it went inactive is remembered; on
/// resume the start is pushed forward by the length of that gap, so
/// `now - start` is always the active time only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityClock {
    start: DateTime<Utc>,
    inactive_since: Option<DateTime<Utc>>,
}

impl ActivityClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            inactive_since: None,
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.start = now;
        self.inactive_since = None;
    }

    /// Idempotent: a second call keeps the first instant
    pub fn mark_inactive(&mut self, now: DateTime<Utc>) {
        if self.inactive_since.is_none() {
            self.inactive_since = Some(now);
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.inactive_since.take() {
            let gap = (now - since).max(Duration::zero());
            self.start += gap;
        }
    }

    pub fn elapsed_start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn inactive_since(&self) -> Option<DateTime<Utc>> {
        self.inactive_since
    }
}
