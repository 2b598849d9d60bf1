//! Tracing subscriber setup for span-level profiling.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber that reports every span's timing on close.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_profiling() -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_profiling();
        assert!(!init_profiling());
    }
}
