use alloy_primitives::Address;
use clap::Parser;
use colored::Colorize;
use safe_multisig::{consts::LATEST_SAFE_VERSION, DeploymentResolver, WalletDeployment};

use crate::{
    cmd::utils::{chain_config, print_field},
    runner::CliContext,
};

#[derive(Debug, Parser)]
#[clap(about = "Resolve the contracts a safe of some version uses on a chain.")]
pub struct DeploymentCommand {
    #[arg(long, value_name = "CHAIN_ID", help = "Chain to resolve on, one of the configured chains.")]
    chain_id: u64,

    #[arg(long, value_name = "VERSION", default_value = LATEST_SAFE_VERSION, help = "Contract version of the safe.")]
    safe_version: String,
}

impl DeploymentCommand {
    pub async fn execute(self, ctx: CliContext) -> eyre::Result<()> {
        let Self { chain_id, safe_version } = self;

        let chain = chain_config(&ctx.config, chain_id)?;
        let resolver = DeploymentResolver::bundled(&ctx.config.latest_safe_version)?;
        let deployment = resolver.resolve(&safe_version, &chain)?;

        println!(
            "{}{}",
            "Resolved deployment on ".bright_cyan(),
            format!("{} ({})", chain.name, chain.chain_id).bold()
        );
        print_deployment(&deployment);

        Ok(())
    }
}

fn print_deployment(deployment: &WalletDeployment) {
    let optional = |address: Option<Address>| {
        address.map(|a| a.to_string()).unwrap_or_else(|| "not deployed".red().to_string())
    };

    print_field("Safe version", &deployment.safe_version);
    print_field(
        if deployment.uses_l2_singleton { "Singleton (L2)" } else { "Singleton" },
        format!("{} (v{})", optional(deployment.singleton_address().ok()), deployment.singleton.version),
    );
    print_field("Proxy factory", optional(deployment.proxy_factory_address().ok()));
    print_field("Fallback handler", optional(deployment.fallback_handler_address().ok()));
    print_field("Multi send", optional(deployment.multi_send_address().ok()));
    print_field("Sign message lib", optional(deployment.sign_message_lib_address().ok()));

    if deployment.predates_supported {
        println!("{}", "Safe version predates the earliest supported version.".bright_yellow());
    }
}
