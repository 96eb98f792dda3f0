use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Token bucket measured in bytes.
///
/// Reservations may drive the balance negative; the caller then waits for the
/// debt to refill. This keeps large chunks from stalling forever when they
/// exceed the bucket capacity.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A bucket holding one second of traffic at `bytes_per_second`.
    pub fn new(bytes_per_second: u64) -> Self {
        Self::with_capacity(bytes_per_second, bytes_per_second)
    }

    pub fn with_capacity(capacity: u64, bytes_per_second: u64) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            refill_rate: bytes_per_second.max(1) as f64,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take `bytes` tokens and return how long the caller must wait before
    /// they are actually covered.
    pub fn reserve(&self, bytes: usize) -> Duration {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;

        state.tokens -= bytes as f64;
        if state.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-state.tokens / self.refill_rate)
        }
    }

    pub async fn acquire(&self, bytes: usize) {
        let wait = self.reserve(bytes);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reserve_within_capacity_is_free() {
        let bucket = TokenBucket::new(1000);
        assert_eq!(bucket.reserve(600), Duration::ZERO);
        assert_eq!(bucket.reserve(400), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reserve_beyond_capacity_waits_for_debt() {
        let bucket = TokenBucket::new(1000);
        assert_eq!(bucket.reserve(1000), Duration::ZERO);
        assert_eq!(bucket.reserve(500), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_sleeps() {
        let bucket = TokenBucket::new(100);
        let start = Instant::now();
        bucket.acquire(100).await;
        bucket.acquire(200).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
