use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::ProviderBuilder;
use alloy_transport::BoxTransport;
use clap::Parser;
use colored::Colorize;
use safe_multisig::{
    calls::OnChainSafe,
    can_execute_now,
    gateway::{ExecutionInfo, TransactionStatus, TransactionSummary},
    should_execute_transaction,
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::{
    cmd::utils::{print_field, resolve_rpc_url},
    runner::CliContext,
};

#[derive(Debug, Parser)]
#[clap(about = "Check whether a transaction can be executed without queueing.")]
pub struct CanExecuteCommand {
    #[arg(long, value_name = "NONCE", help = "Nonce of the transaction.")]
    nonce: U256,

    #[arg(long, value_name = "NONCE", required_unless_present = "safe", help = "Current nonce of the safe.")]
    safe_nonce: Option<U256>,

    #[arg(long, value_name = "THRESHOLD", required_unless_present = "safe", help = "Threshold of the safe.")]
    threshold: Option<U256>,

    #[arg(long, value_name = "ADDRESS", help = "Read nonce and threshold from this safe.")]
    safe: Option<Address>,

    #[arg(long, value_name = "CHAIN_ID", help = "Chain of the safe, selects the configured RPC endpoint.")]
    chain_id: Option<u64>,

    #[arg(long, value_name = "URL", help = "RPC endpoint, overrides the configured one.")]
    rpc_url: Option<String>,

    #[arg(long, requires = "safe", help = "Poll the safe until the transaction can be executed.")]
    watch: bool,

    #[arg(long, value_name = "NONCE", requires = "last_status", help = "Nonce of the last queued transaction.")]
    last_nonce: Option<u64>,

    #[arg(long, value_name = "STATUS", requires = "last_nonce", help = "Status of the last queued transaction, e.g. SUCCESS.")]
    last_status: Option<String>,
}

impl CanExecuteCommand {
    pub async fn execute(self, ctx: CliContext) -> eyre::Result<()> {
        let Self {
            nonce,
            safe_nonce,
            threshold,
            safe,
            chain_id,
            rpc_url,
            watch,
            last_nonce,
            last_status,
        } = self;

        let last_tx = match (last_nonce, last_status) {
            (Some(nonce), Some(status)) => Some(last_transaction(nonce, &status)?),
            _ => None,
        };

        let Some(safe) = safe else {
            let (Some(safe_nonce), Some(threshold)) = (safe_nonce, threshold) else {
                eyre::bail!("either --safe or --safe-nonce with --threshold is required");
            };

            print_field("Safe nonce", safe_nonce);
            print_field("Threshold", threshold);
            print_decision(can_execute_now(safe_nonce, threshold, nonce, last_tx.as_ref()));
            return Ok(());
        };

        let url = resolve_rpc_url(&ctx.config, rpc_url, chain_id)?;
        let provider = ProviderBuilder::new().on_builtin(&url).await?;
        let safe = OnChainSafe::<_, BoxTransport, Ethereum>::new(safe, provider);

        let mut ticker = interval(ctx.config.safe_polling_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let execute = should_execute_transaction(&safe, nonce, last_tx.as_ref()).await?;
            if execute || !watch {
                print_decision(execute);
                return Ok(());
            }

            debug!(target: "safe::cli", safe = %safe.address(), %nonce, "Transaction not executable yet, polling again");
        }
    }
}

fn print_decision(execute: bool) {
    if execute {
        println!("{}", "Transaction can be executed now.".bright_green());
    } else {
        println!("{}", "Transaction has to be queued.".bright_yellow());
    }
}

/// Summary of the last queued transaction, holding just what eligibility looks at.
fn last_transaction(nonce: u64, status: &str) -> eyre::Result<TransactionSummary> {
    let tx_status: TransactionStatus =
        serde_json::from_value(serde_json::Value::String(status.to_uppercase()))?;

    Ok(TransactionSummary {
        id: format!("multisig_{nonce}"),
        timestamp: 0,
        tx_status,
        execution_info: Some(ExecutionInfo::Multisig {
            nonce,
            confirmations_required: 0,
            confirmations_submitted: 0,
            missing_signers: None,
        }),
        tx_info: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, clap::Parser)]
    struct Harness {
        #[command(flatten)]
        command: CanExecuteCommand,
    }

    #[test]
    fn last_status_requires_last_nonce() {
        let err = Harness::try_parse_from([
            "can-execute",
            "--nonce",
            "5",
            "--safe-nonce",
            "5",
            "--threshold",
            "1",
            "--last-status",
            "SUCCESS",
        ])
        .unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn watch_requires_safe() {
        let err = Harness::try_parse_from([
            "can-execute",
            "--nonce",
            "5",
            "--safe-nonce",
            "5",
            "--threshold",
            "1",
            "--watch",
        ])
        .unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn offline_arguments_parse() {
        let harness = Harness::try_parse_from([
            "can-execute",
            "--nonce",
            "5",
            "--safe-nonce",
            "4",
            "--threshold",
            "1",
            "--last-nonce",
            "4",
            "--last-status",
            "success",
        ])
        .unwrap();

        assert_eq!(harness.command.safe_nonce, Some(U256::from(4)));
        assert_eq!(harness.command.last_nonce, Some(4));
    }

    #[test]
    fn status_is_case_insensitive() {
        let tx = last_transaction(4, "success").unwrap();

        assert_eq!(tx.tx_status, TransactionStatus::Success);
        assert_eq!(tx.multisig_nonce(), Some(4));
    }

    #[test]
    fn successor_of_successful_last_tx_executes() {
        let tx = last_transaction(4, "SUCCESS").unwrap();

        assert!(can_execute_now(U256::from(3), U256::from(1), U256::from(5), Some(&tx)));
    }

    #[test]
    fn unknown_status_never_executes_successor() {
        let tx = last_transaction(4, "something_else").unwrap();

        assert_eq!(tx.tx_status, TransactionStatus::Unknown);
        assert!(!can_execute_now(U256::from(3), U256::from(1), U256::from(5), Some(&tx)));
    }
}
