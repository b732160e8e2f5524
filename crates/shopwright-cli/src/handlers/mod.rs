//! Command handlers, kept out of main.rs for testability
//!
//! Each handler module contains the execution logic for one CLI command,
//! the pure helpers it formats output with and their tests.

pub mod adb;
pub mod config;
pub mod locator;
pub mod report;

pub use adb::execute_adb;
pub use config::{check_locators, execute_config, load_settings};
pub use locator::{describe_locator, execute_locator};
pub use report::execute_report;
