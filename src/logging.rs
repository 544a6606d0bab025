//! Logging setup
//!
//! Logs go to stderr so `runbun preview` can keep stdout for the batch.
//! `RUST_LOG` wins when set; otherwise `DEBUG_LOGGING=1` turns on debug
//! output for this crate.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

fn default_directives(debug_logging: bool) -> &'static str {
    if debug_logging {
        "info,runbun=debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug_logging)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "info");
        assert_eq!(default_directives(true), "info,runbun=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::info!("still logging");
    }
}
