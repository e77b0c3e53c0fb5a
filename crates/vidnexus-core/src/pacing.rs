use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Fixed delay inserted after every model call. Also counts the calls.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    calls: AtomicUsize,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a completed call and waits out the delay.
    pub async fn pause(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}
