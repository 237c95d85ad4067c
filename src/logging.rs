//! Logging setup for the provider.
//!
//! Logs are structured `tracing` events written to **stderr**, leaving stdout
//! to the host transport.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`, `custom_provider=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show request-level logs from the API client
//! RUST_LOG=custom_provider::client=debug ./my-host
//!
//! # Show everything the provider emits
//! RUST_LOG=custom_provider=trace ./my-host
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn try_init_with(default_level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
}

/// Initialize the global subscriber, reading `RUST_LOG` (default `info`).
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LOG_LEVEL);
}

/// Initialize logging with a custom default level used when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    if let Err(e) = try_init_with(default_level) {
        panic!("failed to initialize logging: {}", e);
    }
}

/// Try to initialize logging, returning false if a subscriber is already set.
///
/// Safe to call from tests that may run in the same process.
pub fn try_init_logging() -> bool {
    try_init_with(DEFAULT_LOG_LEVEL).is_ok()
}
