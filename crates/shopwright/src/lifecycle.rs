//! Scenario lifecycle: session resets before a scenario, evidence and
//! cleanup after it.
//!
//! The decisions (reset? which session? cleanup?) are plain functions over
//! the scenario tags so they can be checked without a device. [`SuiteState`]
//! carries what survives between scenarios: the driver slot, the feature
//! file of the last reset and whether the report mail went out.

use crate::config::Settings;
use crate::driver::{DriverFactory, DriverManager, Platform};
use crate::element::Ui;
use crate::locator::LocatorBook;
use crate::navigation::Navigator;
use crate::pages::{HomePage, LoginPage, OtpPage};
use crate::permissions::{NotificationPopup, StartupPermissions};
use crate::report;
use crate::result::{ShopError, ShopResult};
use crate::screenshot::ScreenshotStore;
use crate::session::SessionState;
use crate::state::{AppState, AppStateDetector};
use crate::trace::{ScenarioStatus, StepLevel, TraceHandle};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Feature name used when the scenario path has no file name
pub const UNKNOWN_FEATURE: &str = "unknown.feature";

/// Tags that force a fresh session
const RESET_TAGS: &[&str] = &[
    "resetSession",
    "guest",
    "guestSession",
    "productSearch",
    "selfcollect",
    "delivery",
    "order",
    "logout",
];

/// Tags that end the session after the scenario
const CLEANUP_TAGS: &[&str] = &["logout", "selfcollect", "delivery", "order"];

// ===== Scenario facts =====

/// What the hooks know about a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioInfo {
    /// Scenario name
    pub name: String,
    /// Feature file name (no directories)
    pub feature_file: String,
    /// Tags without the leading `@`
    pub tags: Vec<String>,
}

impl ScenarioInfo {
    /// Build from a feature path and raw tags (with or without `@`)
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, feature_path: &Path, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let feature_file = feature_path
            .file_name()
            .map_or_else(|| UNKNOWN_FEATURE.to_string(), |f| f.to_string_lossy().into_owned());
        Self {
            name: name.into(),
            feature_file,
            tags: normalize_tags(tags),
        }
    }

    /// Whether the scenario carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        has_tag(&self.tags, tag)
    }
}

/// Strip `@` and surrounding whitespace from tags
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().trim_start_matches('@').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn has_tag(tags: &[String], tag: &str) -> bool {
    tags.iter().any(|t| t == tag)
}

/// Session a scenario needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Browsing as a guest
    Guest,
    /// Signed in with phone number and OTP
    Otp,
    /// Whatever the freshly launched app shows; no login
    Fresh,
}

impl SessionKind {
    /// Session kind named by the tags; untagged scenarios sign in
    #[must_use]
    pub fn from_tags(tags: &[String]) -> Self {
        if has_tag(tags, "guestSession") {
            Self::Guest
        } else if has_tag(tags, "otpSession") {
            Self::Otp
        } else if ["notification", "resetSession", "freshLaunch"]
            .iter()
            .any(|t| has_tag(tags, t))
        {
            Self::Fresh
        } else {
            warn!("no session tag found, defaulting to OTP session");
            Self::Otp
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Guest => "guest",
            Self::Otp => "otp",
            Self::Fresh => "fresh",
        })
    }
}

/// Whether the app must be relaunched before the scenario
#[must_use]
pub fn should_reset(tags: &[String], feature_file: &str, last_feature: Option<&str>) -> bool {
    RESET_TAGS.iter().any(|t| has_tag(tags, t))
        || feature_file.contains("login")
        || last_feature != Some(feature_file)
}

/// Whether the session ends after the scenario
#[must_use]
pub fn should_cleanup(tags: &[String], failed: bool) -> bool {
    failed || CLEANUP_TAGS.iter().any(|t| has_tag(tags, t))
}

// ===== Suite state =====

/// State shared by every scenario of a run
pub struct SuiteState {
    settings: Settings,
    book: Arc<LocatorBook>,
    drivers: DriverManager,
    last_feature: Mutex<Option<String>>,
    report_sent: AtomicBool,
}

impl fmt::Debug for SuiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteState")
            .field("drivers", &self.drivers)
            .field("last_feature", &self.last_feature())
            .field("report_sent", &self.report_sent())
            .finish_non_exhaustive()
    }
}

impl SuiteState {
    /// State for a run over `settings`, opening sessions with `factory`
    pub fn new(settings: Settings, factory: Arc<dyn DriverFactory>) -> ShopResult<Self> {
        let platform: Platform = settings.appium.platform.parse()?;
        let book = Arc::new(LocatorBook::from_settings(&settings, platform));
        Ok(Self {
            settings,
            book,
            drivers: DriverManager::new(factory),
            last_feature: Mutex::new(None),
            report_sent: AtomicBool::new(false),
        })
    }

    /// Replace the driver manager (retry policy in tests)
    #[must_use]
    pub fn with_drivers(mut self, drivers: DriverManager) -> Self {
        self.drivers = drivers;
        self
    }

    /// Settings of the run
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Driver slot
    #[must_use]
    pub const fn drivers(&self) -> &DriverManager {
        &self.drivers
    }

    /// Feature file of the last reset
    #[must_use]
    pub fn last_feature(&self) -> Option<String> {
        self.last_feature
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_feature(&self, feature: &str) {
        *self.last_feature.lock().unwrap_or_else(PoisonError::into_inner) = Some(feature.to_string());
    }

    /// Whether the report mail went out this run
    #[must_use]
    pub fn report_sent(&self) -> bool {
        self.report_sent.load(Ordering::SeqCst)
    }

    /// Helpers over the current driver, recording into `trace`
    pub fn ui(&self, trace: Option<TraceHandle>) -> ShopResult<Ui> {
        let driver = self.drivers.require()?;
        let ui = Ui::new(driver, Arc::clone(&self.book), self.settings.timeouts)
            .with_screenshots(ScreenshotStore::new(self.settings.reporting.screenshots_dir.clone()));
        Ok(match trace {
            Some(trace) => ui.with_trace(trace),
            None => ui,
        })
    }

    // ===== Before =====

    /// Prepare the app for `scenario` and return the helpers it runs with
    pub async fn before_scenario(
        &self,
        scenario: &ScenarioInfo,
        trace: &TraceHandle,
        session: &mut SessionState,
    ) -> ShopResult<Ui> {
        let last = self.last_feature();
        let reset = should_reset(&scenario.tags, &scenario.feature_file, last.as_deref());
        if reset || self.drivers.is_invalid().await {
            info!(scenario = %scenario.name, reset, "resetting session before scenario");
            session.reset();
            self.set_last_feature(&scenario.feature_file);
            self.restart(trace).await;
        }

        if self.drivers.is_invalid().await {
            let message = format!("driver is not initialized before scenario: {}", scenario.name);
            error!("{message}");
            record(trace, StepLevel::Error, &message);
            return Err(ShopError::state(message));
        }

        let ui = self.ui(Some(Arc::clone(trace)))?;
        let kind = SessionKind::from_tags(&scenario.tags);
        let ui = self.ensure_session(kind, ui, trace, session).await?;

        if scenario.has_tag("notifications") {
            NotificationPopup::new(ui.clone()).dismiss_discount_if_present().await;
        }
        Ok(ui)
    }

    /// New session plus startup permissions. Failures are logged only.
    async fn restart(&self, trace: &TraceHandle) {
        if let Err(e) = self.drivers.initialize_with_retry().await {
            warn!(error = %e, "driver reset failed");
            record(trace, StepLevel::Warn, &format!("Driver reset failed: {e}"));
            return;
        }
        match self.ui(Some(Arc::clone(trace))) {
            Ok(ui) => {
                if let Err(e) = StartupPermissions::new(ui.clone()).handle().await {
                    ui.warn_step(format!("Error during permission popup handling: {e}"));
                }
            }
            Err(e) => warn!(error = %e, "no driver after reset"),
        }
    }

    /// Relaunch after an unknown state and accept the notification popup
    async fn relaunch(&self, trace: &TraceHandle) -> ShopResult<Ui> {
        warn!("unknown app state, restarting app");
        self.drivers.initialize_with_retry().await?;
        let ui = self.ui(Some(Arc::clone(trace)))?;
        NotificationPopup::new(ui.clone()).handle_if_present().await;
        Ok(ui)
    }

    async fn ensure_session(
        &self,
        kind: SessionKind,
        ui: Ui,
        trace: &TraceHandle,
        session: &mut SessionState,
    ) -> ShopResult<Ui> {
        if kind == SessionKind::Fresh {
            ui.step("Fresh launch, skipping login");
            return Ok(ui);
        }
        let state = AppStateDetector::new(ui.clone()).detect().await;
        ui.step(format!("Ensuring {kind} session from state: {state}"));
        let ui = match (kind, state) {
            (SessionKind::Guest, AppState::HomeScreenGuest) | (SessionKind::Otp, AppState::HomeScreenOtp) => {
                ui.step(format!("Already in {kind} session"));
                return Ok(ui);
            }
            (_, AppState::NotificationPopup) => {
                NotificationPopup::new(ui.clone()).handle_if_present().await;
                ui
            }
            (_, AppState::LoginScreen) => ui,
            (SessionKind::Guest, AppState::HomeScreenOtp) | (SessionKind::Otp, AppState::HomeScreenGuest) => {
                Navigator::from_settings(ui.clone(), &self.settings)
                    .logout(session)
                    .await?;
                ui
            }
            _ => self.relaunch(trace).await?,
        };
        match kind {
            SessionKind::Guest => {
                LoginPage::new(ui.clone()).continue_as_guest().await?;
                session.logged_in = false;
            }
            _ => {
                self.login(&ui).await?;
                session.logged_in = true;
            }
        }
        Ok(ui)
    }

    /// Phone number, OTP, home page
    async fn login(&self, ui: &Ui) -> ShopResult<()> {
        let account = &self.settings.account;
        let login = LoginPage::new(ui.clone());
        login.enter_phone_number(&account.phone_number).await?;
        login.click_continue().await?;
        let otp = OtpPage::new(ui.clone());
        otp.enter_otp(&account.otp).await?;
        otp.wait_for_verification_and_home_redirect().await?;
        if HomePage::new(ui.clone()).wait_for_home_page().await {
            Ok(())
        } else {
            Err(ShopError::assertion("Home page not shown after OTP login"))
        }
    }

    // ===== After =====

    /// Screenshot, trace file, cleanup and the once-per-run report mail
    pub async fn after_scenario(&self, scenario: &ScenarioInfo, trace: &TraceHandle, failed: bool) {
        let driver = self.drivers.current();
        if let Some(driver) = driver.as_deref() {
            if let Err(e) = driver.page_source().await {
                debug!(error = %e, "layout refresh failed");
            }
        }
        let label = if failed { "Failure Screenshot" } else { "Success Screenshot" };
        ScreenshotStore::new(self.settings.reporting.screenshots_dir.clone())
            .capture_and_attach(driver.as_deref(), Some(trace), label, failed)
            .await;

        if should_cleanup(&scenario.tags, failed) {
            info!(scenario = %scenario.name, "tearing down session after scenario");
            self.drivers.quit().await;
        }

        trace
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finish(if failed {
                ScenarioStatus::Failed
            } else {
                ScenarioStatus::Passed
            });
        self.save_trace(trace);

        // Trace goes into the archive; rewritten with the mail outcome
        if !self.report_sent() {
            self.send_report(trace).await;
            self.save_trace(trace);
        }
    }

    fn save_trace(&self, trace: &TraceHandle) {
        let finished = trace.lock().unwrap_or_else(PoisonError::into_inner);
        match finished.save_json(&self.settings.reporting.traces_dir) {
            Ok(path) => debug!(path = %path.display(), "trace written"),
            Err(e) => error!(error = %e, "failed to write trace"),
        }
    }

    async fn send_report(&self, trace: &TraceHandle) {
        match report::archive_and_mail(&self.settings.reporting, &self.settings.email).await {
            Ok(true) => {
                self.report_sent.store(true, Ordering::SeqCst);
                attach(trace, "Report Sent", "Report emailed.");
            }
            Ok(false) => attach(trace, "Email Skipped", "email.enabled=false"),
            Err(e) => {
                error!(error = %e, "failed to email report");
                attach(trace, "Email Error", &e.to_string());
            }
        }
    }
}

fn record(trace: &TraceHandle, level: StepLevel, message: &str) {
    trace
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .record(level, message);
}

fn attach(trace: &TraceHandle, name: &str, text: &str) {
    trace
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .attach_text(name, text);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{AppDriver, MockDriver, MockElement};
    use crate::locator::Locator;
    use crate::permissions::KEY_GUEST_BUTTON;
    use crate::state::{KEY_ACTIVE_ORDER, KEY_SELF_COLLECT_TAB};
    use crate::trace::{AttachmentKind, ScenarioTrace};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::time::Duration;

    fn tags(list: &[&str]) -> Vec<String> {
        normalize_tags(list)
    }

    #[test]
    fn test_scenario_info_normalizes() {
        let info = ScenarioInfo::new("Buy cement", Path::new("features/cart.feature"), ["@order", " guestSession"]);
        assert_eq!(info.feature_file, "cart.feature");
        assert_eq!(info.tags, vec!["order", "guestSession"]);
        assert!(info.has_tag("order"));
        assert_eq!(ScenarioInfo::new("x", Path::new(""), ["a"]).feature_file, UNKNOWN_FEATURE);
    }

    #[test]
    fn test_session_kind() {
        assert_eq!(SessionKind::from_tags(&tags(&["@guestSession"])), SessionKind::Guest);
        assert_eq!(SessionKind::from_tags(&tags(&["@otpSession", "@order"])), SessionKind::Otp);
        assert_eq!(SessionKind::from_tags(&tags(&["@freshLaunch"])), SessionKind::Fresh);
        assert_eq!(SessionKind::from_tags(&tags(&["@notification"])), SessionKind::Fresh);
        assert_eq!(SessionKind::from_tags(&tags(&["@smoke"])), SessionKind::Otp);
    }

    #[test]
    fn test_should_reset() {
        let same = Some("cart.feature");
        assert!(should_reset(&tags(&["@order"]), "cart.feature", same));
        assert!(should_reset(&tags(&[]), "login.feature", Some("login.feature")));
        assert!(should_reset(&tags(&[]), "cart.feature", None));
        assert!(should_reset(&tags(&[]), "cart.feature", Some("home.feature")));
        assert!(!should_reset(&tags(&["@otpSession"]), "cart.feature", same));
    }

    #[test]
    fn test_should_cleanup() {
        assert!(should_cleanup(&tags(&[]), true));
        assert!(should_cleanup(&tags(&["@delivery"]), false));
        assert!(!should_cleanup(&tags(&["@guestSession", "@notifications"]), false));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn failed_scenarios_always_clean_up(raw in prop::collection::vec("@?[a-zA-Z]{1,12}", 0..6)) {
                prop_assert!(should_cleanup(&normalize_tags(&raw), true));
            }

            #[test]
            fn new_feature_always_resets(raw in prop::collection::vec("[a-z]{1,8}", 0..4), feature in "[a-z]{1,8}\\.feature") {
                prop_assert!(should_reset(&normalize_tags(&raw), &feature, None));
            }
        }
    }

    /// Hands out clones of one mock so tests can script the screen
    #[derive(Debug)]
    struct SharedMock(Option<MockDriver>);

    #[async_trait]
    impl DriverFactory for SharedMock {
        async fn create(&self) -> ShopResult<Arc<dyn AppDriver>> {
            match &self.0 {
                Some(mock) => {
                    mock.set_alive(true);
                    Ok(Arc::new(mock.clone()))
                }
                None => Err(ShopError::state("no device")),
            }
        }
    }

    fn settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.reporting.screenshots_dir = dir.join("report/shots");
        settings.reporting.traces_dir = dir.join("report/traces");
        settings.reporting.report_dir = dir.join("report");
        settings.reporting.archive_path = dir.join("report.zip");
        for (k, v) in [
            (KEY_GUEST_BUTTON, "Continue as Guest"),
            (KEY_SELF_COLLECT_TAB, "Self Collect"),
            (KEY_ACTIVE_ORDER, "Active Order"),
        ] {
            settings.locators.insert(k.to_string(), v.to_string());
        }
        settings
    }

    fn suite(dir: &Path, mock: Option<MockDriver>) -> SuiteState {
        let drivers = DriverManager::new(Arc::new(SharedMock(mock.clone())))
            .with_retry_policy(1, Duration::from_millis(1));
        SuiteState::new(settings(dir), Arc::new(SharedMock(mock)))
            .unwrap()
            .with_drivers(drivers)
    }

    fn trace() -> TraceHandle {
        ScenarioTrace::start("scenario", "cart.feature", Vec::new()).shared()
    }

    fn guest_home() -> MockDriver {
        MockDriver::android().with(
            Locator::text(crate::driver::Platform::Android, "Self Collect"),
            MockElement::visible(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_keeps_existing_guest_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = suite(dir.path(), Some(guest_home()));
        let info = ScenarioInfo::new("browse", Path::new("home.feature"), ["@guestSession"]);
        let mut session = SessionState::default();
        state.before_scenario(&info, &trace(), &mut session).await.unwrap();
        assert_eq!(state.last_feature().as_deref(), Some("home.feature"));
        assert!(!session.logged_in);
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_without_device_is_invalid_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = suite(dir.path(), None);
        let info = ScenarioInfo::new("browse", Path::new("home.feature"), ["@freshLaunch"]);
        let err = state
            .before_scenario(&info, &trace(), &mut SessionState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::InvalidState { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_writes_evidence_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mock = guest_home();
        let state = suite(dir.path(), Some(mock.clone()));
        state.drivers().initialize().await.unwrap();
        let info = ScenarioInfo::new("checkout", Path::new("cart.feature"), ["@order"]);
        let handle = trace();
        state.after_scenario(&info, &handle, false).await;

        assert!(!mock.is_alive().await);
        let trace = handle.lock().unwrap();
        assert_eq!(trace.status, ScenarioStatus::Passed);
        assert!(trace
            .attachments
            .iter()
            .any(|a| a.kind == AttachmentKind::Image && a.name == "Success Screenshot"));
        assert!(trace.attachments.iter().any(|a| a.name == "Email Skipped"));
        let written: Vec<PathBuf> = std::fs::read_dir(dir.path().join("report/traces"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(!state.report_sent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mailed_archive_holds_trace_and_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let mock = guest_home();
        let mut settings = settings(dir.path());
        // No recipients: the send fails after the archive is written
        settings.email.enabled = true;
        let drivers = DriverManager::new(Arc::new(SharedMock(Some(mock.clone()))))
            .with_retry_policy(1, Duration::from_millis(1));
        let state = SuiteState::new(settings, Arc::new(SharedMock(Some(mock))))
            .unwrap()
            .with_drivers(drivers);
        state.drivers().initialize().await.unwrap();
        let info = ScenarioInfo::new("browse", Path::new("home.feature"), ["@guestSession"]);
        let handle = trace();
        state.after_scenario(&info, &handle, false).await;

        let archive = std::fs::File::open(dir.path().join("report.zip")).unwrap();
        let mut zip = zip::ZipArchive::new(archive).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("traces/") && n.ends_with(".json")), "{names:?}");
        assert!(names.iter().any(|n| n.starts_with("shots/") && n.ends_with(".png")), "{names:?}");

        assert!(!state.report_sent());
        let saved = handle.lock().unwrap().file_name();
        let on_disk = ScenarioTrace::load_json(&dir.path().join("report/traces").join(saved)).unwrap();
        assert!(on_disk.attachments.iter().any(|a| a.name == "Email Error"));
    }
}
