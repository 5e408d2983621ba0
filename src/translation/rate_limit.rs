use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Consulted by the batch translator before each row.
pub trait RateLimiter: Send + Sync {
    fn before_each_row(&self) -> impl Future<Output = ()> + Send;
}

/// No spacing; only yields to the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    async fn before_each_row(&self) {
        tokio::task::yield_now().await;
    }
}

/// Keeps at least `interval` between two consecutive rows.
///
/// Time already spent translating the previous row counts toward the interval.
#[derive(Debug)]
pub struct FixedInterval {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl RateLimiter for FixedInterval {
    async fn before_each_row(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// Either limiter, chosen from configuration at runtime.
#[derive(Debug)]
pub enum ConfiguredLimiter {
    Unlimited(Unlimited),
    Fixed(FixedInterval),
}

impl ConfiguredLimiter {
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            ConfiguredLimiter::Unlimited(Unlimited)
        } else {
            ConfiguredLimiter::Fixed(FixedInterval::new(interval))
        }
    }
}

impl RateLimiter for ConfiguredLimiter {
    async fn before_each_row(&self) {
        match self {
            ConfiguredLimiter::Unlimited(l) => l.before_each_row().await,
            ConfiguredLimiter::Fixed(l) => l.before_each_row().await,
        }
    }
}
