//! Diagnostic output for a conversion run
//!
//! Diagnostics go to stderr through `tracing`. The subscriber is built from
//! a [`Verbosity`] value and installed as the default for the duration of a
//! run rather than globally.

use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::cli::Verbosity;

/// Timestamp layout of verbose diagnostics
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl Verbosity {
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::OFF,
            Verbosity::Normal => LevelFilter::ERROR,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Build the diagnostic subscriber for a run. Verbose output carries
/// timestamps; normal output is errors only.
pub fn dispatch(verbosity: Verbosity) -> Dispatch {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_max_level(verbosity.level_filter());

    match verbosity {
        Verbosity::Verbose => Dispatch::new(
            builder
                .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
                .finish(),
        ),
        Verbosity::Quiet | Verbosity::Normal => Dispatch::new(builder.without_time().finish()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filters() {
        assert_eq!(Verbosity::Quiet.level_filter(), LevelFilter::OFF);
        assert_eq!(Verbosity::Normal.level_filter(), LevelFilter::ERROR);
        assert_eq!(Verbosity::Verbose.level_filter(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_dispatch_respects_verbosity() {
        let quiet = dispatch(Verbosity::Quiet);
        tracing::dispatcher::with_default(&quiet, || {
            assert!(!tracing::enabled!(tracing::Level::ERROR));
        });

        let verbose = dispatch(Verbosity::Verbose);
        tracing::dispatcher::with_default(&verbose, || {
            assert!(tracing::enabled!(tracing::Level::DEBUG));
            assert!(!tracing::enabled!(tracing::Level::TRACE));
        });
    }
}
