use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "VIDEO_ORGANIZER_LOG";

/// Installs the global subscriber. Logs go to stderr so they do not mix
/// with the summary tables on stdout.
///
/// `VIDEO_ORGANIZER_LOG` wins over `verbose`; without either only warnings
/// are shown.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "video_organizer=debug" } else { "warn" };
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_filter.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}
