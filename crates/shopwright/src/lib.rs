//! Shopwright: end-to-end tests for the shop mobile app, driven through Appium.
//!
//! The crate holds everything below the Gherkin layer: a WebDriver client,
//! configurable locators, page objects for every app screen, the multi-page
//! flows built from them and the scenario lifecycle (session resets,
//! screenshots, traces, report mail).
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌──────────────┐   ┌───────────┐
//! │ Feature files │──►│ Steps (CLI)   │──►│ Page objects │──►│ AppDriver │──► Appium
//! │ (Gherkin)     │   │ + lifecycle   │   │ + Navigator  │   │           │
//! └───────────────┘   └───────────────┘   └──────────────┘   └───────────┘
//!                            │                    │
//!                            ▼                    ▼
//!                     traces / screenshots   LocatorBook (YAML)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use shopwright::{config::Settings, driver::AppiumFactory, lifecycle::SuiteState};
//! use std::sync::Arc;
//!
//! let settings = Settings::load(None)?;
//! let suite = SuiteState::new(settings.clone(), Arc::new(AppiumFactory::new(settings.appium)))?;
//! ```

#![warn(missing_docs)]

/// Device serial helpers (`adb push`, media scan)
pub mod adb;
/// YAML settings and environment overrides
pub mod config;
/// The [`driver::AppDriver`] seam, the Appium client and the mock
pub mod driver;
/// Element helpers shared by all pages
pub mod element;
/// Android key codes
pub mod keyboard;
/// Scenario hooks and suite state
pub mod lifecycle;
/// Locator keys and their resolution
pub mod locator;
/// Multi-page flows
pub mod navigation;
/// Page objects
pub mod pages;
/// System and in-app permission dialogs
pub mod permissions;
/// Payment reference generation
pub mod reference;
/// Report archive and mail
pub mod report;
/// Error type
pub mod result;
/// Screenshot storage
pub mod screenshot;
/// Per-scenario session and payment data
pub mod session;
/// App state detection
pub mod state;
/// Toast checks
pub mod toast;
/// Scenario traces
pub mod trace;
/// Polling waits
pub mod wait;

pub use config::Settings;
pub use driver::{AppDriver, DriverManager, MockDriver, Platform};
pub use element::Ui;
pub use lifecycle::{ScenarioInfo, SessionKind, SuiteState};
pub use locator::{Locator, LocatorBook};
pub use navigation::Navigator;
pub use result::{ShopError, ShopResult};
pub use session::{PaymentContext, SessionState};
pub use trace::{ScenarioTrace, TraceHandle};
