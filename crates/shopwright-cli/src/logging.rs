//! `tracing` subscriber setup.
//!
//! The filter comes from the verbosity flags unless `RUST_LOG` is set.
//! `--log-json` switches the formatter to JSON lines for CI log collectors.

use crate::config::CliConfig;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter for `config`, with `RUST_LOG` taking precedence
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(config: &CliConfig) {
    let filter = env_filter(config);
    let result = if config.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(config.verbosity.is_debug())
            .with_ansi(config.use_color())
            .with_writer(std::io::stderr)
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "subscriber already installed");
    }
}
