use std::path::PathBuf;

use clap::{
    builder::{styling::AnsiColor, Styles},
    ArgAction, Parser, Subcommand,
};
use safe_cli::{
    cmd::{
        can_execute::CanExecuteCommand, chains::ChainsCommand, deployment::DeploymentCommand,
        signatures::SignaturesCommand, tx_hash::TxHashCommand,
    },
    logging,
    runner::CliRunner,
};
use safe_multisig::SafeConfig;

/// The verbosity level.
pub type Verbosity = u8;

#[derive(Debug, Parser)]
#[command(
    name = "safe",
    about = "Hash, sign and check transactions of Safe multisig wallets.",
    version,
    term_width = 80,
    styles = get_color_style()
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "PATH", help = "Path to a YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,

    /// Verbosity level of the log messages.
    ///
    /// Pass multiple times to increase the verbosity (e.g. -v, -vv, -vvv).
    ///
    /// - 1 (-v): info
    /// - 2 (-vv): debug
    /// - 3 (-vvv): trace
    #[arg(help_heading = "Display options", global = true, short, long, verbatim_doc_comment, action = ArgAction::Count)]
    verbosity: Verbosity,
}

impl Cli {
    pub fn run(self) -> eyre::Result<()> {
        logging::init_tracing(self.debug, self.verbosity)?;

        let config = match &self.config {
            Some(path) => SafeConfig::load(path)?,
            None => SafeConfig::default(),
        };

        let runner = CliRunner::new(config);
        match self.command {
            Commands::TxHash(tx_hash) => runner.run_command_until_exit(|ctx| tx_hash.execute(ctx)),
            Commands::Signatures(signatures) => {
                runner.run_command_until_exit(|ctx| signatures.execute(ctx))
            }
            Commands::CanExecute(can_execute) => {
                runner.run_command_until_exit(|ctx| can_execute.execute(ctx))
            }
            Commands::Deployment(deployment) => {
                runner.run_command_until_exit(|ctx| deployment.execute(ctx))
            }
            Commands::Chains(chains) => runner.run_command_until_exit(|ctx| chains.execute(ctx)),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(name = "tx-hash")]
    TxHash(TxHashCommand),

    #[command(name = "signatures")]
    Signatures(SignaturesCommand),

    #[command(name = "can-execute")]
    CanExecute(CanExecuteCommand),

    #[command(name = "deployment")]
    Deployment(DeploymentCommand),

    #[command(name = "chains")]
    Chains(ChainsCommand),
}

fn get_color_style() -> Styles {
    Styles::styled()
        .usage(AnsiColor::Green.on_default().bold().underline())
        .header(AnsiColor::Yellow.on_default().bold().underline())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "safe",
            "deployment",
            "--chain-id",
            "71401",
            "--config",
            "safe.yaml",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("safe.yaml")));
        assert_eq!(cli.verbosity, 2);
        assert!(matches!(cli.command, Commands::Deployment(_)));
    }
}
