use clap::Parser;
use colored::Colorize;
use safe_multisig::{ChainConfig, SafeConfig};

use crate::{cmd::utils::print_field, runner::CliContext};

#[derive(Debug, Parser)]
#[clap(about = "List the configured chains and service endpoints.")]
pub struct ChainsCommand {}

impl ChainsCommand {
    pub async fn execute(self, ctx: CliContext) -> eyre::Result<()> {
        print_config(&ctx.config);
        Ok(())
    }
}

fn print_config(config: &SafeConfig) {
    print_field("Gateway", &config.gateway_url);
    print_field("Latest safe version", &config.latest_safe_version);
    print_field("Safe polling interval", format!("{:?}", config.safe_polling_interval()));
    print_field("Provider watch interval", format!("{:?}", config.provider_watch_interval()));

    for chain in &config.chains {
        println!();
        println!("{}", chain_title(chain).bold());
        print_field("RPC", chain.rpc_url.as_deref().unwrap_or("-"));
        print_field("Transaction service", chain.transaction_service_url.as_deref().unwrap_or("-"));
    }
}

fn chain_title(chain: &ChainConfig) -> String {
    match chain.l2 {
        true => format!("{} ({}, L2)", chain.name, chain.chain_id),
        false => format!("{} ({})", chain.name, chain.chain_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_marks_l2_chains() {
        let config = SafeConfig::default();

        assert_eq!(chain_title(config.chain(1).unwrap()), "Ethereum (1)");
        assert_eq!(chain_title(config.chain(100).unwrap()), "Gnosis Chain (100, L2)");
    }
}
