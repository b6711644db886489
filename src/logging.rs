//! Logging setup.
//!
//! The provider logs through `tracing`. Output goes to **stderr** so it never
//! mixes with anything the host reads from stdout.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `dirconfig_provider=debug`)
//!
//! ```bash
//! # Show every configuration API request and planned operation
//! RUST_LOG=dirconfig_provider=debug ./dirconfig-provider
//! ```
//!
//! Attribute values are never logged; operations are logged by attribute name.

use tracing::Subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn subscriber(default_level: &str) -> impl Subscriber + Send + Sync + 'static {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize logging at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level.
///
/// `default_level` is any `EnvFilter` directive (`"debug"`,
/// `"warn,dirconfig_provider=debug"`) and applies when `RUST_LOG` is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Useful in tests, where several cases may race to install a subscriber.
pub fn try_init_logging() -> bool {
    subscriber("info").try_init().is_ok()
}
