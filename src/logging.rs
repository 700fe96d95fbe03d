//! Logger setup for the command-line binary.
//!
//! The library never installs a global subscriber; embedders either install
//! their own or hand one to [`Checker::with_logger`](crate::checker::Checker::with_logger).

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{AppResult, config_error};

/// Level selected by `-v` / `-q`.
///
/// `quiet` wins; otherwise 0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE.
pub fn verbosity_level(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE
    }
}

/// Install a stderr subscriber.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
pub fn init_logging(verbose: u8, quiet: bool) -> AppResult<()> {
    let level = verbosity_level(verbose, quiet);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sql_audit={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| config_error(format!("初始化日志失败: {}", e)))
}

/// Subscriber for a single request, meant for [`tracing::Dispatch`].
pub fn request_dispatch(level: Level) -> tracing::Dispatch {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::Dispatch::new(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let cases = [
            ((0, true), Level::ERROR),
            ((3, true), Level::ERROR),
            ((0, false), Level::WARN),
            ((1, false), Level::INFO),
            ((2, false), Level::DEBUG),
            ((7, false), Level::TRACE)
        ];
        for ((verbose, quiet), expected) in cases {
            assert_eq!(verbosity_level(verbose, quiet), expected);
        }
    }
}
