//! Tracing initialisation for the `triage` binary.
//!
//! Logs go to stderr so command output on stdout stays pipeable.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Default level for the `--verbose` flag.
pub fn level_for(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::WARN }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Only the first call in a process
/// takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .json(),
            )
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_target(false),
            )
            .try_init()
            .ok();
    }
}
