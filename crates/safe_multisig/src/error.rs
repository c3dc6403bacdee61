use alloy_primitives::{Address, B256};
use strum::IntoStaticStr;

use crate::{
    address::TranslationError, deployments::ResolutionError, gateway::GatewayError,
    pagination::PaginationError, signatures::AssemblyError,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [Error], for callers that only need to branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Resolution,
    TranslationNotFound,
    PaginationExhausted,
    Assembly,
    HashMismatch,
    Config,
    Network,
    InvalidInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// The locally computed typed-data hash differs from the one the contract computed.
    #[error("safe tx hash mismatch for {safe}: local {local}, on-chain {on_chain}")]
    HashMismatch { safe: Address, local: B256, on_chain: B256 },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("invalid safe version {0:?}")]
    InvalidVersion(String),

    #[error("failed to build typed data: {0}")]
    TypedData(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Contract(#[from] alloy_contract::Error),

    #[error(transparent)]
    Transport(#[from] alloy_transport::TransportError),

    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),

    #[error("threshold {threshold} is not reachable with {owners} owners")]
    InvalidThreshold { threshold: u64, owners: usize },

    #[error("{owner} is not an owner of the safe")]
    NotAnOwner { owner: Address },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Resolution(_) => ErrorKind::Resolution,
            Error::Translation(TranslationError::NotFound(_)) => ErrorKind::TranslationNotFound,
            Error::Translation(TranslationError::Directory(_)) => ErrorKind::Network,
            Error::Pagination(PaginationError::Exhausted) => ErrorKind::PaginationExhausted,
            Error::Pagination(_) => ErrorKind::Network,
            Error::Assembly(_) => ErrorKind::Assembly,
            Error::HashMismatch { .. } => ErrorKind::HashMismatch,
            Error::Config(_) => ErrorKind::Config,
            Error::Gateway(_) | Error::Contract(_) | Error::Transport(_) | Error::Signer(_) => {
                ErrorKind::Network
            }
            Error::InvalidVersion(_)
            | Error::TypedData(_)
            | Error::InvalidThreshold { .. }
            | Error::NotAnOwner { .. } => ErrorKind::InvalidInput,
        }
    }
}
