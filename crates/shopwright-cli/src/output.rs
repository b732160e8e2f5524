//! Terminal output: status lines, spinners and the run summary

use crate::config::CliConfig;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use shopwright::trace::SuiteSummary;
use std::time::Duration;

/// Status line printer
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
    /// Print detail lines
    pub verbose: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter writing to stderr
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
            verbose: false,
        }
    }

    /// Reporter for the global flags: color, `-q` and `-v`
    #[must_use]
    pub fn from_config(config: &CliConfig) -> Self {
        Self {
            verbose: config.verbosity.is_verbose(),
            ..Self::new(config.use_color(), config.verbosity.is_quiet())
        }
    }

    fn line(&self, symbol: &str, plain: &str, color: Style, message: &str) {
        let prefix = if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line("✓", "PASS", Style::new().green(), message);
        }
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        self.line("✗", "FAIL", Style::new().red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.line("⚠", "WARN", Style::new().yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.line("ℹ", "INFO", Style::new().blue(), message);
        }
    }

    /// Print an info message only with `-v`
    pub fn detail(&self, message: &str) {
        if self.verbose {
            self.info(message);
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Spinner for a slow step; hidden in quiet mode
    #[must_use]
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Print the scenario totals and the failed scenario names
    pub fn summary(&self, summary: &SuiteSummary, duration: Duration) {
        if self.quiet && summary.failed == 0 {
            return;
        }
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&summary_line(summary, duration, self.use_color));
        for name in &summary.failures {
            self.failure(name);
        }
    }
}

/// `PASSED 3 scenarios in 1.50s (3 passed, 0 failed, 0 skipped)`
#[must_use]
pub fn summary_line(summary: &SuiteSummary, duration: Duration, use_color: bool) -> String {
    let failed = summary.failed > 0;
    let status = if failed { "FAILED" } else { "PASSED" };
    let status = if use_color {
        let color = if failed { Style::new().red() } else { Style::new().green() };
        color.bold().apply_to(status).to_string()
    } else {
        status.to_string()
    };
    format!(
        "{status} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
        summary.total(),
        duration.as_secs_f64(),
        summary.passed,
        summary.failed,
        summary.skipped
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line_plain() {
        let summary = SuiteSummary {
            passed: 3,
            failed: 1,
            skipped: 0,
            failures: vec!["Guest adds cement to cart".to_string()],
        };
        let line = summary_line(&summary, Duration::from_millis(1500), false);
        assert_eq!(line, "FAILED 4 scenarios in 1.50s (3 passed, 1 failed, 0 skipped)");
    }

    #[test]
    fn test_summary_line_passed() {
        let summary = SuiteSummary {
            passed: 2,
            ..SuiteSummary::default()
        };
        assert!(summary_line(&summary, Duration::ZERO, false).starts_with("PASSED 2 scenarios"));
    }

    #[test]
    fn test_detail_follows_verbosity() {
        use crate::config::Verbosity;
        let normal = Reporter::from_config(&CliConfig::new());
        assert!(!normal.verbose);
        let verbose = Reporter::from_config(&CliConfig::new().with_verbosity(Verbosity::Verbose));
        assert!(verbose.verbose);
        assert!(!verbose.quiet);
        let quiet = Reporter::from_config(&CliConfig::new().with_verbosity(Verbosity::Quiet));
        assert!(quiet.quiet && !quiet.verbose);
    }

    #[test]
    fn test_quiet_spinner_is_hidden() {
        let reporter = Reporter::new(false, true);
        assert!(reporter.spinner("zipping").is_hidden());
    }
}
