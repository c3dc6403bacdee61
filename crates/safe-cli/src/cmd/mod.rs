pub mod can_execute;
pub mod chains;
pub mod deployment;
pub mod signatures;
pub mod tx_hash;
pub(crate) mod utils;
