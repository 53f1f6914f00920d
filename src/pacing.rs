use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Spaces out calls to one upstream service. Every call kind shares the
/// same `last_call`, and each caller names the gap it needs since the
/// previous call of any kind.
///
/// The first call also waits its full interval, so a run that starts right
/// after a previous one still respects the upstream quota.
#[derive(Debug, Default)]
pub struct Pacer {
    last_call: Option<Instant>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay_before_next(&self, interval: Duration) -> Duration {
        match self.last_call {
            Some(last) => interval.saturating_sub(last.elapsed()),
            None => interval,
        }
    }

    pub async fn wait(&mut self, interval: Duration) {
        let delay = self.delay_before_next(interval);
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.last_call = Some(Instant::now());
    }
}
