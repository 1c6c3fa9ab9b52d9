//! Fixed-interval pacing for outbound requests.
//!
//! The legacy API gets touchy when hammered; callers space their requests by
//! awaiting [`Pacer::wait`] before each one. The interval comes from
//! configuration so the delay is tunable (and zero in tests).

use std::time::Duration;

use tokio::time::Instant;

/// Spaces successive operations by a fixed interval.
///
/// The first `wait` returns immediately; each later call suspends until one
/// interval has passed since the previous call. A zero interval disables
/// pacing entirely.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    /// Create a pacer with the given interval between operations.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Wait until the interval has elapsed since the previous `wait`.
    pub async fn wait(&mut self) {
        if self.interval.is_zero() {
            return;
        }
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last = Some(Instant::now());
    }
}
