use alloy_primitives::{address, Address};
use networks::{ethereum, gnosis, godwoken_mainnet, godwoken_testnet, sepolia};

use crate::config::ChainConfig;

pub const LATEST_SAFE_VERSION: &str = "1.3.0";

/// Oldest safe version with its own deployment, older safes fall back to it.
pub const EARLIEST_SUPPORTED_SAFE_VERSION: &str = "1.0.0";

pub const GATEWAY_URL: &str = "https://safe-client.gnosis.io";

pub const SAFE_POLLING_INTERVAL_MS: u64 = 15_000;

pub const PROVIDER_WATCH_INTERVAL_MS: u64 = 3_000;

/// Head of the owner linked list kept by the safe.
pub const SENTINEL_ADDRESS: Address = address!("0000000000000000000000000000000000000001");

/// Deployments get twice the node's gas estimate.
pub const DEPLOYMENT_GAS_MULTIPLIER: u64 = 2;

pub mod networks {
    pub mod ethereum {
        pub const CHAIN_ID: u64 = 1;
        pub const NAME: &str = "Ethereum";
        pub const RPC_URL: &str = "https://cloudflare-eth.com";
        pub const TRANSACTION_SERVICE_URL: &str =
            "https://safe-transaction-mainnet.safe.global/api";
    }

    pub mod sepolia {
        pub const CHAIN_ID: u64 = 11155111;
        pub const NAME: &str = "Sepolia";
        pub const RPC_URL: &str = "https://rpc.sepolia.org";
        pub const TRANSACTION_SERVICE_URL: &str =
            "https://safe-transaction-sepolia.safe.global/api";
    }

    pub mod gnosis {
        pub const CHAIN_ID: u64 = 100;
        pub const NAME: &str = "Gnosis Chain";
        pub const RPC_URL: &str = "https://rpc.gnosischain.com";
        pub const TRANSACTION_SERVICE_URL: &str =
            "https://safe-transaction-gnosis-chain.safe.global/api";
    }

    pub mod godwoken_mainnet {
        pub const CHAIN_ID: u64 = 71402;
        pub const NAME: &str = "Godwoken";
        pub const RPC_URL: &str = "https://v1.mainnet.godwoken.io/rpc";
    }

    pub mod godwoken_testnet {
        pub const CHAIN_ID: u64 = 71401;
        pub const NAME: &str = "Godwoken Testnet";
        pub const RPC_URL: &str = "https://godwoken-testnet-v1.ckbapp.dev";
    }
}

/// Chains known without any configuration file.
pub fn default_chains() -> Vec<ChainConfig> {
    vec![
        ChainConfig {
            chain_id: ethereum::CHAIN_ID,
            name: ethereum::NAME.to_string(),
            l2: false,
            rpc_url: Some(ethereum::RPC_URL.to_string()),
            transaction_service_url: Some(ethereum::TRANSACTION_SERVICE_URL.to_string()),
        },
        ChainConfig {
            chain_id: sepolia::CHAIN_ID,
            name: sepolia::NAME.to_string(),
            l2: false,
            rpc_url: Some(sepolia::RPC_URL.to_string()),
            transaction_service_url: Some(sepolia::TRANSACTION_SERVICE_URL.to_string()),
        },
        ChainConfig {
            chain_id: gnosis::CHAIN_ID,
            name: gnosis::NAME.to_string(),
            l2: true,
            rpc_url: Some(gnosis::RPC_URL.to_string()),
            transaction_service_url: Some(gnosis::TRANSACTION_SERVICE_URL.to_string()),
        },
        ChainConfig {
            chain_id: godwoken_mainnet::CHAIN_ID,
            name: godwoken_mainnet::NAME.to_string(),
            l2: true,
            rpc_url: Some(godwoken_mainnet::RPC_URL.to_string()),
            transaction_service_url: None,
        },
        ChainConfig {
            chain_id: godwoken_testnet::CHAIN_ID,
            name: godwoken_testnet::NAME.to_string(),
            l2: true,
            rpc_url: Some(godwoken_testnet::RPC_URL.to_string()),
            transaction_service_url: None,
        },
    ]
}
