use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tokio::time::timeout;

use crate::error::{ProbeError, Result};

/// Tokens replenished per second per host.
const TOKENS_PER_SECOND: NonZeroU32 = NonZeroU32::new(10).unwrap();
/// Maximum burst per host.
const BURST: NonZeroU32 = NonZeroU32::new(1).unwrap();

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-host token buckets, created lazily on first access and kept for the
/// life of the run. The keyed store is sharded internally, so workers
/// contend per host rather than on one global lock.
pub struct HostRateLimiter {
    limiter: KeyedLimiter,
    max_delay: Duration,
}

impl HostRateLimiter {
    pub fn new(max_delay: Duration) -> Self {
        let quota = Quota::per_second(TOKENS_PER_SECOND).allow_burst(BURST);
        Self { limiter: RateLimiter::keyed(quota), max_delay }
    }

    /// Take a token for `host`, waiting at most the configured budget.
    /// A timeout is a terminal per-attempt failure, never retried.
    pub async fn acquire(&self, host: &str) -> Result<()> {
        timeout(self.max_delay, self.limiter.until_key_ready(&host.to_string()))
            .await
            .map_err(|_| ProbeError::RateLimitTimeout {
                host: host.to_string(),
                waited_secs: self.max_delay.as_secs(),
            })
    }
}
