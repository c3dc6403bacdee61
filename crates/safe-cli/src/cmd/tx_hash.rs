use alloy_network::Ethereum;
use alloy_primitives::Address;
use alloy_provider::ProviderBuilder;
use alloy_transport::BoxTransport;
use clap::Parser;
use colored::Colorize;
use safe_multisig::{calls, consts::LATEST_SAFE_VERSION, SafeTransactionData, TypedDataHasher};

use crate::{
    cmd::utils::{print_field, resolve_rpc_url, SafeTxArgs},
    runner::CliContext,
};

#[derive(Debug, Parser)]
#[clap(about = "Compute the EIP-712 hash of a safe transaction.")]
pub struct TxHashCommand {
    #[arg(value_name = "SAFE", help = "Address of the safe.")]
    safe: Address,

    #[arg(long, value_name = "CHAIN_ID", help = "Chain the safe lives on.")]
    chain_id: u64,

    #[arg(long, value_name = "VERSION", default_value = LATEST_SAFE_VERSION, help = "Contract version of the safe.")]
    safe_version: String,

    #[clap(flatten)]
    tx: SafeTxArgs,

    #[arg(long, help = "Print the typed data document to sign.")]
    typed_data: bool,

    #[arg(long, help = "Check the hash against getTransactionHash of the deployed safe.")]
    verify: bool,

    #[arg(long, value_name = "URL", help = "RPC endpoint, defaults to the configured chain RPC. Implies --verify.")]
    rpc_url: Option<String>,
}

impl TxHashCommand {
    pub async fn execute(self, ctx: CliContext) -> eyre::Result<()> {
        let Self { safe, chain_id, safe_version, tx, typed_data, verify, rpc_url } = self;

        let tx = SafeTransactionData::from(tx);
        let hasher = TypedDataHasher::new(chain_id);

        if typed_data {
            let document = hasher.typed_data(safe, &safe_version, &tx)?.to_json()?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }

        let hash = match verify || rpc_url.is_some() {
            true => {
                let url = resolve_rpc_url(&ctx.config, rpc_url, Some(chain_id))?;
                let provider = ProviderBuilder::new().on_builtin(&url).await?;
                let hash = calls::verify_transaction_hash::<_, BoxTransport, Ethereum>(
                    &hasher,
                    safe,
                    &safe_version,
                    &tx,
                    &provider,
                )
                .await?;
                println!("{}", "Hash matches getTransactionHash of the safe.".bright_green());
                hash
            }
            false => hasher.hash(safe, &safe_version, &tx)?,
        };

        print_field("Safe tx hash", hash);

        Ok(())
    }
}
