//! Tracing subscriber setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub fn default_directive(logging: bool) -> &'static str {
    if logging {
        "info"
    } else {
        "warn"
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` overrides the level implied by `logging`.
///
/// # Errors
/// Fails if a global subscriber is already installed
pub fn init(logging: bool, json: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(logging)));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    }
}
