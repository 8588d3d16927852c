//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{ForecastError, ForecastResult};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "MISSIONCAST_LOG";

/// Installs the global subscriber.
///
/// Filtering follows `MISSIONCAST_LOG` and defaults to `info`. With `json`
/// set, events are written as one JSON object per line.
pub fn init_tracing(json: bool) -> ForecastResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ForecastError::internal(format!("failed to install tracing subscriber: {e}")))
}

/// Installs a subscriber with explicit filter directives.
pub fn init_tracing_with_filter(directives: &str) -> ForecastResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directives))
        .with_target(true)
        .try_init()
        .map_err(|e| ForecastError::internal(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_an_error_not_a_panic() {
        let first = init_tracing_with_filter("warn");
        let second = init_tracing(false);
        assert!(first.is_ok() || first.unwrap_err().is_internal());
        assert!(second.unwrap_err().is_internal());
    }
}
