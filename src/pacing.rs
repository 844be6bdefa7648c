//! Delay between detail-page visits.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

#[async_trait]
pub trait Pacing: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a uniformly random interval in `[min, max]`.
#[derive(Debug, Clone)]
pub struct RandomPacing {
    min: Duration,
    max: Duration,
}

impl RandomPacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            return Self { min: max, max: min };
        }
        Self { min, max }
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

#[async_trait]
impl Pacing for RandomPacing {
    async fn pause(&self) {
        tokio::time::sleep(self.next_delay()).await;
    }
}

/// No delay at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacing for NoPacing {
    async fn pause(&self) {}
}
