//! Polling waits.
//!
//! Every UI expectation in the suite is an explicit wait: a check is polled
//! until it yields a value or the timeout elapses.

use crate::config::TimeoutSettings;
use crate::result::{ShopError, ShopResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl From<&TimeoutSettings> for WaitOptions {
    fn from(t: &TimeoutSettings) -> Self {
        Self {
            timeout_ms: t.default_ms,
            poll_interval_ms: t.poll_ms,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set timeout from a duration
    #[must_use]
    pub const fn with_timeout_duration(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Async poller
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub const fn new(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Poll `check` until it returns `Some`. The check runs at least once.
    ///
    /// Check errors count as "not yet"; the last one is reported in the
    /// timeout error.
    pub async fn until<T, F, Fut>(&self, what: &str, mut check: F) -> ShopResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ShopResult<Option<T>>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let mut last_error: Option<String> = None;
        loop {
            match check().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => {
                    debug!(what, error = %e, "wait check failed");
                    last_error = Some(e.to_string());
                }
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                let what = match last_error {
                    Some(e) => format!("{what} (last error: {e})"),
                    None => what.to_string(),
                };
                return Err(ShopError::Timeout {
                    what,
                    ms: self.options.timeout_ms,
                });
            }
            let remaining = timeout.saturating_sub(elapsed);
            tokio::time::sleep(self.options.poll_interval().min(remaining)).await;
        }
    }

    /// Poll a boolean check until it returns `true`
    pub async fn until_true<F, Fut>(&self, what: &str, mut check: F) -> ShopResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ShopResult<bool>>,
    {
        self.until(what, || {
            let fut = check();
            async move { fut.await.map(|ok| ok.then_some(())) }
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(timeout_ms: u64) -> Waiter {
        Waiter::new(
            WaitOptions::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(1),
        )
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_from_timeout_settings() {
            let t = TimeoutSettings {
                default_ms: 1234,
                poll_ms: 7,
                ..TimeoutSettings::default()
            };
            let opts = WaitOptions::from(&t);
            assert_eq!(opts.timeout(), Duration::from_millis(1234));
            assert_eq!(opts.poll_interval(), Duration::from_millis(7));
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_until_returns_value_after_polls() {
            let calls = AtomicU32::new(0);
            let value = fast(1_000)
                .until("counter", || async {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Ok((n >= 3).then_some(n))
                })
                .await
                .unwrap();
            assert_eq!(value, 3);
        }

        #[tokio::test]
        async fn test_until_times_out_with_last_error() {
            let err = fast(20)
                .until::<(), _, _>("ghost", || async {
                    Err(ShopError::assertion("still loading"))
                })
                .await
                .unwrap_err();
            match err {
                ShopError::Timeout { what, ms } => {
                    assert_eq!(ms, 20);
                    assert!(what.contains("ghost"));
                    assert!(what.contains("still loading"));
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_zero_timeout_checks_once() {
            let calls = AtomicU32::new(0);
            let result = fast(0)
                .until_true("once", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(false)
                })
                .await;
            assert!(result.unwrap_err().is_timeout());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }
}
