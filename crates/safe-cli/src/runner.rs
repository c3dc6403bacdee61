use std::{future::Future, sync::Arc, time::Duration};

use safe_multisig::SafeConfig;
use tracing::{debug, trace};

/// Time given to spawned tasks to finish once the command returned.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state handed to every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: Arc<SafeConfig>,
}

/// Runs a command to completion on a fresh multi-threaded tokio runtime.
#[derive(Debug, Default)]
pub struct CliRunner {
    config: Arc<SafeConfig>,
}

impl CliRunner {
    pub fn new(config: SafeConfig) -> Self {
        Self { config: Arc::new(config) }
    }

    /// Executes the future returned by `command` until it resolves or ctrl-c is received.
    pub fn run_command_until_exit<F, E>(
        self,
        command: impl FnOnce(CliContext) -> F,
    ) -> Result<(), E>
    where
        F: Future<Output = Result<(), E>>,
        E: Send + Sync + From<std::io::Error> + 'static,
    {
        let runtime = tokio_runtime()?;
        let context = CliContext { config: self.config };

        let result = runtime.block_on(run_until_ctrl_c(command(context)));

        trace!(target: "safe::cli", "Shutting down runtime");
        runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

        result
    }
}

fn tokio_runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: From<std::io::Error>,
{
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            debug!(target: "safe::cli", "Received ctrl-c");
            Ok(())
        }
        res = fut => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_sees_config() {
        let config = SafeConfig { latest_safe_version: "1.1.1".to_string(), ..Default::default() };

        let result: eyre::Result<()> = CliRunner::new(config).run_command_until_exit(|ctx| async move {
            eyre::ensure!(ctx.config.latest_safe_version == "1.1.1", "wrong config");
            Ok(())
        });

        assert!(result.is_ok());
    }

    #[test]
    fn command_error_is_returned() {
        let result: eyre::Result<()> = CliRunner::default()
            .run_command_until_exit(|_| async { Err(eyre::eyre!("boom")) });

        assert_eq!(result.unwrap_err().to_string(), "boom");
    }
}
