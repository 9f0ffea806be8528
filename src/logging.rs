//! Tracing subscriber setup.
//!
//! Human-readable output by default, one JSON object per event with
//! `json_logs`. `RUST_LOG` overrides the level chosen from `verbose`.

use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    pub json: bool,
    /// Debug level for bkweb's own events
    pub verbose: bool,
}

fn default_directive(config: LogConfig) -> String {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    format!("{}={}", env!("CARGO_CRATE_NAME"), level.as_str().to_lowercase())
}

/// Install the global subscriber. Call once, after config is loaded.
pub fn init(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let output = if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        fmt::layer().compact().with_target(false).boxed()
    };

    tracing_subscriber::registry().with(output).with(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(default_directive(LogConfig::default()), "bkweb=info");
        assert_eq!(
            default_directive(LogConfig {
                verbose: true,
                json: true,
            }),
            "bkweb=debug"
        );
    }
}
