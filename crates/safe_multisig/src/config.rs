use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{address::StaticAddressDirectory, consts};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {0}: {1}")]
    UnableToOpenFile(PathBuf, std::io::Error),

    #[error("unable to parse config file {0}: {1}")]
    UnableToParseFile(PathBuf, serde_yaml::Error),

    #[error("chain id {0} is not supported")]
    UnknownChain(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    /// Roll-up / side chain, eligible for the L2 singleton.
    #[serde(default)]
    pub l2: bool,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub transaction_service_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPair {
    pub external: Address,
    pub internal: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SafeConfig {
    pub gateway_url: String,
    pub latest_safe_version: String,
    pub safe_polling_interval_ms: u64,
    pub provider_watch_interval_ms: u64,
    pub chains: Vec<ChainConfig>,
    pub address_map: Vec<AddressPair>,
}

impl Default for SafeConfig {
    fn default() -> Self {
        Self {
            gateway_url: consts::GATEWAY_URL.to_string(),
            latest_safe_version: consts::LATEST_SAFE_VERSION.to_string(),
            safe_polling_interval_ms: consts::SAFE_POLLING_INTERVAL_MS,
            provider_watch_interval_ms: consts::PROVIDER_WATCH_INTERVAL_MS,
            chains: consts::default_chains(),
            address_map: Vec::new(),
        }
    }
}

impl SafeConfig {
    /// Loads a YAML config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::UnableToOpenFile(path.to_path_buf(), e))?;
        let config = Self::from_yaml(&contents)
            .map_err(|e| ConfigError::UnableToParseFile(path.to_path_buf(), e))?;

        debug!(target: "safe::config", path = %path.display(), chains = config.chains.len(), "Loaded config");

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig, ConfigError> {
        self.chains
            .iter()
            .find(|c| c.chain_id == chain_id)
            .ok_or(ConfigError::UnknownChain(chain_id))
    }

    pub fn safe_polling_interval(&self) -> Duration {
        Duration::from_millis(self.safe_polling_interval_ms)
    }

    pub fn provider_watch_interval(&self) -> Duration {
        Duration::from_millis(self.provider_watch_interval_ms)
    }

    /// In-memory address directory seeded from `address_map`.
    pub fn address_directory(&self) -> StaticAddressDirectory {
        self.address_map.iter().map(|pair| (pair.external, pair.internal)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressTranslator;
    use std::io::Write;

    #[test]
    fn defaults_cover_known_chains() {
        let config = SafeConfig::default();

        assert_eq!(config.latest_safe_version, "1.3.0");
        assert!(config.chain(71402).unwrap().l2);
        assert!(!config.chain(1).unwrap().l2);
        assert!(matches!(config.chain(9999), Err(ConfigError::UnknownChain(9999))));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SafeConfig::from_yaml("gateway_url: http://localhost:8001\n").unwrap();

        assert_eq!(config.gateway_url, "http://localhost:8001");
        assert_eq!(config.safe_polling_interval(), Duration::from_secs(15));
        assert_eq!(config.chains, consts::default_chains());
    }

    #[tokio::test]
    async fn loads_file_with_address_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chains:
  - chain_id: 71401
    name: Godwoken Testnet
    l2: true
address_map:
  - external: "0x1111111111111111111111111111111111111111"
    internal: "0x2222222222222222222222222222222222222222"
"#
        )
        .unwrap();

        let config = SafeConfig::load(file.path()).unwrap();
        assert_eq!(config.chains.len(), 1);

        let directory = config.address_directory();
        assert_eq!(
            directory.to_internal(Address::repeat_byte(0x11)).await.unwrap(),
            Address::repeat_byte(0x22)
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let err = SafeConfig::load(Path::new("/nonexistent/safe.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnableToOpenFile(..)));
    }
}
