use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{DeployError, Result};

/// Cooperative cancellation flag shared between an interrupt handler and a
/// polling loop.
///
/// Setting the token does no I/O; the loop that observes it performs the
/// remote cancel itself.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, signal) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        signal.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`, waking early on cancellation.
    ///
    /// Returns whether the token is cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, signal) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = signal
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Cancel this token on Ctrl+C.
    ///
    /// Only one handler can be installed per process.
    pub fn install_interrupt_handler(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || token.cancel()).map_err(|e| {
            DeployError::Config(format!("failed to install interrupt handler: {}", e))
        })
    }
}
