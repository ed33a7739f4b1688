//! Logging infrastructure for Tenet.
//!
//! Structured logging controlled by environment variables:
//!
//! - `TENET_DEBUG=true|1|yes` - Enable debug logging
//! - `TENET_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TENET_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use tenet_query::logging;
//!
//! // Initialize once at startup
//! logging::init();
//! ```
//!
//! Within Tenet, the standard tracing macros are used with structured
//! fields:
//!
//! ```rust,ignore
//! use tracing::{debug, info};
//!
//! debug!(sql = %sql, "Executing query");
//! info!(tenant = %tenant_id, table = %table, "Transaction committed");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `TENET_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("TENET_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `TENET_LOG_LEVEL`.
///
/// Defaults to "debug" if `TENET_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    if let Ok(level) = env::var("TENET_LOG_LEVEL") {
        match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => {
                if is_debug_enabled() {
                    "debug"
                } else {
                    "warn"
                }
            }
        }
    } else if is_debug_enabled() {
        "debug"
    } else {
        "warn"
    }
}

/// Get the configured log format from `TENET_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("TENET_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the Tenet logging system.
///
/// Call once at application startup; subsequent calls are no-ops. Without
/// the `tracing-subscriber` feature this does nothing and the host
/// application's subscriber receives Tenet's events.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("TENET_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "tenet_query={},tenet_postgres={}",
                level, level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "Tenet logging initialized"
            );
        }
    });
}

/// Macro for conditional debug logging.
///
/// Only logs if `TENET_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! tenet_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_disabled_by_default() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("TENET_DEBUG");
        }
        assert!(!is_debug_enabled());
    }

    #[test]
    fn test_log_level_default() {
        // SAFETY: Test runs in isolation
        unsafe {
            env::remove_var("TENET_DEBUG");
            env::remove_var("TENET_LOG_LEVEL");
        }
        assert_eq!(get_log_level(), "warn");
    }
}
