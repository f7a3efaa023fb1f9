//! Tracing setup shared by the `backport` CLI and `backportd`.
//!
//! `RUST_LOG` wins over the level passed in. Only the first call installs a
//! subscriber; later calls return quietly.

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Filter used when `RUST_LOG` is unset or unparsable.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber. Poll spans are logged when they close, so
/// each line of a pass carries the PR id and the closing line its timing.
pub fn init_tracing(json: bool, level: Level) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);
    let fmt_layer = if json {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    let installed = Registry::default()
        .with(env_filter(level))
        .with(fmt_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
