//! Logging setup for `cascade` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log filter:
//! 1. `--verbose` CLI flag (debug)
//! 2. `CASCADE_LOG` environment variable (e.g. "info", "cascade=trace")
//! 3. `log_level` in the global config file
//! 4. default to `warn`
//!
//! Logs are sent to STDERR so that stdout stays usable for command output,
//! including `--format json`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "CASCADE_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(verbose: bool, configured: Option<&str>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env.as_deref(), configured);

    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {}", directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}

/// Picks the filter directive according to the priority order above
fn filter_directive(verbose: bool, env: Option<&str>, configured: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }

    [env, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
        .to_string()
}
