//! `tracing` subscriber setup.
//!
//! Host applications call [`init_subscriber`] once at startup. `RUST_LOG`
//! takes precedence over the configured level when set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the global subscriber.
///
/// `level` is an `EnvFilter` directive (e.g. `"info"` or
/// `"hypr_transport=debug,info"`). With `json` set, events are written as
/// one JSON object per line.
///
/// Returns `false` if a global subscriber was already installed; calling
/// this twice is harmless.
pub fn init_subscriber(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_noop() {
        let _ = init_subscriber("debug", false);
        assert!(!init_subscriber("info", true));
    }
}
