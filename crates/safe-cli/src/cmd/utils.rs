use alloy_primitives::{Address, Bytes, U256};
use clap::{Args, ValueEnum};
use colored::Colorize;
use safe_multisig::{
    AddressTranslator, ChainConfig, Confirmation, IdentityTranslator, Operation, SafeConfig,
    SafeTransactionData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Call,
    DelegateCall,
}

impl From<OperationArg> for Operation {
    fn from(value: OperationArg) -> Self {
        match value {
            OperationArg::Call => Operation::Call,
            OperationArg::DelegateCall => Operation::DelegateCall,
        }
    }
}

/// Fields of a safe transaction, as passed on the command line.
#[derive(Debug, Clone, Args)]
pub struct SafeTxArgs {
    #[arg(long, value_name = "ADDRESS", help = "Target of the transaction.")]
    pub to: Address,

    #[arg(long, value_name = "WEI", default_value = "0", help = "Value sent along, in wei.")]
    pub value: U256,

    #[arg(long, value_name = "HEX", default_value = "0x", help = "Calldata of the transaction.")]
    pub data: Bytes,

    #[arg(long, value_enum, default_value = "call")]
    pub operation: OperationArg,

    #[arg(long, value_name = "NONCE", help = "Safe nonce of the transaction.")]
    pub nonce: U256,

    #[arg(long, value_name = "GAS", default_value = "0")]
    pub safe_tx_gas: U256,

    #[arg(long, value_name = "GAS", default_value = "0")]
    pub base_gas: U256,

    #[arg(long, value_name = "WEI", default_value = "0")]
    pub gas_price: U256,

    #[arg(long, value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub gas_token: Address,

    #[arg(long, value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub refund_receiver: Address,
}

impl From<SafeTxArgs> for SafeTransactionData {
    fn from(args: SafeTxArgs) -> Self {
        Self {
            to: args.to,
            value: args.value,
            data: args.data,
            operation: args.operation.into(),
            safe_tx_gas: args.safe_tx_gas,
            base_gas: args.base_gas,
            gas_price: args.gas_price,
            gas_token: args.gas_token,
            refund_receiver: args.refund_receiver,
            nonce: args.nonce,
        }
    }
}

/// Parses `OWNER:SIGNATURE`, or a bare `OWNER` for an on-chain approval.
pub fn parse_confirmation(value: &str) -> Result<Confirmation, String> {
    let (owner, signature) = match value.split_once(':') {
        Some((owner, signature)) => (owner, Some(signature)),
        None => (value, None),
    };

    let owner: Address = owner.parse().map_err(|e| format!("invalid owner {owner}: {e}"))?;

    match signature {
        Some(signature) => {
            let signature: Bytes =
                signature.parse().map_err(|e| format!("invalid signature {signature}: {e}"))?;
            Ok(Confirmation::signed(owner, signature))
        }
        None => Ok(Confirmation::pre_validated(owner)),
    }
}

/// The configured address directory, or identity when no address map is configured.
pub fn address_translator(config: &SafeConfig) -> Box<dyn AddressTranslator> {
    if config.address_map.is_empty() {
        Box::new(IdentityTranslator)
    } else {
        Box::new(config.address_directory())
    }
}

pub fn chain_config(config: &SafeConfig, chain_id: u64) -> eyre::Result<ChainConfig> {
    Ok(config.chain(chain_id)?.clone())
}

/// `--rpc-url` if given, otherwise the RPC endpoint configured for `chain_id`.
pub fn resolve_rpc_url(
    config: &SafeConfig,
    rpc_url: Option<String>,
    chain_id: Option<u64>,
) -> eyre::Result<String> {
    if let Some(url) = rpc_url {
        return Ok(url);
    }

    let Some(chain_id) = chain_id else {
        eyre::bail!("RPC URL is required without --chain-id");
    };

    chain_config(config, chain_id)?
        .rpc_url
        .ok_or_else(|| eyre::eyre!("no RPC URL configured for chain {chain_id}, pass --rpc-url"))
}

pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{}{}", format!("{label}: ").bright_cyan(), value.to_string().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use safe_multisig::{config::AddressPair, consts::networks::gnosis};

    #[test]
    fn confirmation_with_signature() {
        let sig = format!("0x{}", "11".repeat(65));
        let confirmation =
            parse_confirmation(&format!("0x0000000000000000000000000000000000000001:{sig}"))
                .unwrap();

        assert_eq!(confirmation.owner, address!("0000000000000000000000000000000000000001"));
        assert_eq!(confirmation.signature.map(|s| s.len()), Some(65));
    }

    #[test]
    fn bare_owner_is_pre_validated() {
        let confirmation =
            parse_confirmation("0x0000000000000000000000000000000000000002").unwrap();

        assert_eq!(confirmation, Confirmation::pre_validated(Address::left_padding_from(&[2])));
    }

    #[test]
    fn invalid_owner_is_rejected() {
        assert!(parse_confirmation("bogus:0x00").is_err());
    }

    #[test]
    fn rpc_url_falls_back_to_chain_config() {
        let config = SafeConfig::default();

        assert_eq!(
            resolve_rpc_url(&config, Some("http://localhost:8545".to_string()), Some(1)).unwrap(),
            "http://localhost:8545"
        );
        assert_eq!(
            resolve_rpc_url(&config, None, Some(gnosis::CHAIN_ID)).unwrap(),
            gnosis::RPC_URL
        );
        assert!(resolve_rpc_url(&config, None, None).is_err());
        assert!(resolve_rpc_url(&config, None, Some(424242)).is_err());
    }

    #[test]
    fn chain_without_rpc_url_needs_flag() {
        let mut config = SafeConfig::default();
        config.chains.iter_mut().for_each(|chain| chain.rpc_url = None);

        let err = resolve_rpc_url(&config, None, Some(1)).unwrap_err();
        assert!(err.to_string().contains("--rpc-url"));
    }

    #[tokio::test]
    async fn address_map_selects_directory() {
        let external = Address::repeat_byte(0x01);
        let internal = Address::repeat_byte(0x81);

        let identity = address_translator(&SafeConfig::default());
        assert_eq!(identity.to_internal(external).await.unwrap(), external);

        let config = SafeConfig {
            address_map: vec![AddressPair { external, internal }],
            ..Default::default()
        };
        let directory = address_translator(&config);
        assert_eq!(directory.to_internal(external).await.unwrap(), internal);
        assert!(directory.to_internal(Address::repeat_byte(0x02)).await.is_err());
    }
}
