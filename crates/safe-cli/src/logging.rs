use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Level used when `RUST_LOG` is unset. `--debug` raises it to at least debug.
pub fn log_level(debug: bool, verbosity: u8) -> LevelFilter {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    if debug {
        level.max(LevelFilter::DEBUG)
    } else {
        level
    }
}

/// Installs the global `fmt` subscriber. Logs go to stderr so command output stays parseable.
pub fn init_tracing(debug: bool, verbosity: u8) -> eyre::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(log_level(debug, verbosity).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(log_level(false, 0), LevelFilter::WARN);
        assert_eq!(log_level(false, 1), LevelFilter::INFO);
        assert_eq!(log_level(false, 5), LevelFilter::TRACE);
    }

    #[test]
    fn debug_flag_never_lowers_level() {
        assert_eq!(log_level(true, 0), LevelFilter::DEBUG);
        assert_eq!(log_level(true, 3), LevelFilter::TRACE);
    }
}
