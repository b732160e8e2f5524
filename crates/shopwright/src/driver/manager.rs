//! Ownership of the current device session.
//!
//! Scenarios run one at a time, so a single slot is enough. The slot is
//! shared by the lifecycle hooks (which create and quit sessions) and the
//! scenario world (which hands the current driver to the page objects).

use super::{build_capabilities, AppDriver, AppiumDriver};
use crate::config::AppiumSettings;
use crate::result::{ShopError, ShopResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, warn};

/// Default number of session creation attempts
pub const DEFAULT_INIT_ATTEMPTS: u32 = 2;

/// Default pause between session creation attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// Creates driver sessions
#[async_trait]
pub trait DriverFactory: Send + Sync + fmt::Debug {
    /// Open a new session
    async fn create(&self) -> ShopResult<Arc<dyn AppDriver>>;
}

/// Factory opening real Appium sessions from settings
#[derive(Debug, Clone)]
pub struct AppiumFactory {
    settings: AppiumSettings,
}

impl AppiumFactory {
    /// Create a factory
    #[must_use]
    pub const fn new(settings: AppiumSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl DriverFactory for AppiumFactory {
    async fn create(&self) -> ShopResult<Arc<dyn AppDriver>> {
        let (platform, caps) = build_capabilities(&self.settings)?;
        let driver = AppiumDriver::connect(&self.settings.url, platform, caps).await?;
        Ok(Arc::new(driver))
    }
}

/// Holder of the current session
pub struct DriverManager {
    factory: Arc<dyn DriverFactory>,
    slot: Mutex<Option<Arc<dyn AppDriver>>>,
    init_attempts: u32,
    retry_delay: Duration,
}

impl fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverManager")
            .field("factory", &self.factory)
            .field("has_driver", &self.current().is_some())
            .field("init_attempts", &self.init_attempts)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl DriverManager {
    /// Create an empty manager
    #[must_use]
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
            init_attempts: DEFAULT_INIT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the retry policy used by [`DriverManager::initialize_with_retry`]
    #[must_use]
    pub const fn with_retry_policy(mut self, attempts: u32, delay: Duration) -> Self {
        self.init_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    fn replace(&self, driver: Option<Arc<dyn AppDriver>>) -> Option<Arc<dyn AppDriver>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, driver)
    }

    /// The current driver, if any
    pub fn current(&self) -> Option<Arc<dyn AppDriver>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current driver, or [`ShopError::InvalidState`]
    pub fn require(&self) -> ShopResult<Arc<dyn AppDriver>> {
        self.current()
            .ok_or_else(|| ShopError::state("driver is not initialized"))
    }

    /// Open a session, replacing (and quitting) any previous one.
    pub async fn initialize(&self) -> ShopResult<Arc<dyn AppDriver>> {
        self.quit().await;
        let driver = self.factory.create().await?;
        info!(session = driver.session_id(), platform = %driver.platform(), "driver initialized");
        self.replace(Some(Arc::clone(&driver)));
        Ok(driver)
    }

    /// [`DriverManager::initialize`] with retries; a session that does not
    /// answer right after creation counts as a failed attempt.
    pub async fn initialize_with_retry(&self) -> ShopResult<Arc<dyn AppDriver>> {
        let attempts = self.init_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.initialize().await {
                Ok(driver) => {
                    if driver.is_alive().await {
                        return Ok(driver);
                    }
                    warn!(attempt, "driver created but not responding");
                    last_error = Some(ShopError::state("driver created but not responding"));
                }
                Err(e) => {
                    warn!(attempt, error = %e, "driver initialization failed");
                    last_error = Some(e);
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        self.quit().await;
        let cause = last_error.map_or_else(String::new, |e| e.to_string());
        error!(attempts, %cause, "driver initialization gave up");
        Err(ShopError::state(format!(
            "driver initialization failed after {attempts} attempts: {cause}"
        )))
    }

    /// Quit and clear the current session. Errors are logged only.
    pub async fn quit(&self) {
        if let Some(driver) = self.replace(None) {
            match driver.quit().await {
                Ok(()) => info!(session = driver.session_id(), "driver quit"),
                Err(e) => warn!(session = driver.session_id(), error = %e, "driver quit failed"),
            }
        }
    }

    /// True when there is no driver or the session stopped answering
    pub async fn is_invalid(&self) -> bool {
        match self.current() {
            Some(driver) => !driver.is_alive().await,
            None => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Default)]
    struct CountingFactory {
        calls: AtomicU32,
        fail_first: u32,
        dead_sessions: bool,
    }

    #[async_trait]
    impl DriverFactory for CountingFactory {
        async fn create(&self) -> ShopResult<Arc<dyn AppDriver>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                return Err(ShopError::state(format!("attempt {n} refused")));
            }
            let mock = MockDriver::android();
            mock.set_alive(!self.dead_sessions);
            Ok(Arc::new(mock))
        }
    }

    fn manager(factory: Arc<CountingFactory>) -> DriverManager {
        DriverManager::new(factory).with_retry_policy(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_empty_manager_is_invalid() {
        let m = manager(Arc::new(CountingFactory::default()));
        assert!(m.is_invalid().await);
        assert!(m.require().is_err());
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_failure() {
        let factory = Arc::new(CountingFactory {
            fail_first: 1,
            ..CountingFactory::default()
        });
        let m = manager(Arc::clone(&factory));
        m.initialize_with_retry().await.unwrap();
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
        assert!(!m.is_invalid().await);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let factory = Arc::new(CountingFactory {
            fail_first: 5,
            ..CountingFactory::default()
        });
        let m = manager(Arc::clone(&factory));
        let err = m.initialize_with_retry().await.unwrap_err();
        assert!(err.to_string().contains("after 2 attempts"));
        assert!(m.current().is_none());
    }

    #[tokio::test]
    async fn test_dead_session_counts_as_failure() {
        let factory = Arc::new(CountingFactory {
            dead_sessions: true,
            ..CountingFactory::default()
        });
        let m = manager(Arc::clone(&factory));
        assert!(m.initialize_with_retry().await.is_err());
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_initialize_replaces_and_quits_previous() {
        let m = manager(Arc::new(CountingFactory::default()));
        let first = m.initialize().await.unwrap();
        let second = m.initialize().await.unwrap();
        assert!(!first.is_alive().await);
        assert!(second.is_alive().await);
        m.quit().await;
        assert!(m.is_invalid().await);
    }
}
