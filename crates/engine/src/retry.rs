use std::future::Future;
use std::time::Duration;

use tracing::warn;

use common::{Error, Result};

/// How the pause between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure.
    Constant,
    /// `delay × attempt number`: 1×, 2×, 3×, …
    Linear,
}

/// Bounded retry with capped backoff for market data calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Candle fetches: 3 attempts, waiting 1.5s then 3s.
    pub const CANDLES: RetryPolicy = RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(1500),
        backoff: Backoff::Linear,
        max_delay: Duration::from_secs(10),
    };

    /// Last-price lookups: 3 attempts, 0.8s apart.
    pub const PRICE: RetryPolicy = RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(800),
        backoff: Backoff::Constant,
        max_delay: Duration::from_secs(10),
    };

    /// Same attempt count, no waiting. For tests.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            delay: Duration::ZERO,
            backoff: Backoff::Constant,
            max_delay: Duration::ZERO,
        }
    }

    /// Pause after the failed attempt with zero-based index `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Constant => self.delay,
            Backoff::Linear => self.delay.saturating_mul(attempt + 1),
        };
        delay.min(self.max_delay)
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up.
///
/// No pause follows the final attempt. The terminal error is
/// `Error::FetchExhausted` carrying the last failure's message.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = String::from("no attempts made");
    for attempt in 0..policy.attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_error = e.to_string();
                if attempt + 1 < policy.attempts {
                    let delay = policy.delay_after(attempt);
                    warn!(what, attempt = attempt + 1, error = %e, backoff = ?delay, "Request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(Error::FetchExhausted {
        what: what.to_string(),
        attempts: policy.attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn candle_backoff_grows_linearly() {
        let p = RetryPolicy::CANDLES;
        assert_eq!(p.delay_after(0), Duration::from_millis(1500));
        assert_eq!(p.delay_after(1), Duration::from_millis(3000));
    }

    #[test]
    fn backoff_is_capped() {
        let p = RetryPolicy {
            max_delay: Duration::from_secs(2),
            ..RetryPolicy::CANDLES
        };
        assert_eq!(p.delay_after(5), Duration::from_secs(2));
    }

    #[test]
    fn price_backoff_is_constant() {
        let p = RetryPolicy::PRICE;
        assert_eq!(p.delay_after(0), p.delay_after(2));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out = retry(&RetryPolicy::immediate(3), "candles", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::Http("timeout".into()))
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_last_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let err = retry(&RetryPolicy::immediate(3), "candles BTCUSDT", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Error::Http("connection reset".into()))
        })
        .await
        .unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        match err {
            Error::FetchExhausted {
                what,
                attempts,
                last_error,
            } => {
                assert_eq!(what, "candles BTCUSDT");
                assert_eq!(attempts, 3);
                assert!(last_error.contains("connection reset"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
