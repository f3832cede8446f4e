use std::time::Duration;

/// Poll cadence and time budgets for deployment monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between status reads
    pub interval: Duration,
    /// Budget for a started deployment to leave `pending`, and for a
    /// cancellation to be confirmed
    pub start_timeout: Duration,
    /// Budget for each remote step to finish
    pub step_timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            start_timeout: Duration::from_secs(60),
            step_timeout: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }
}
