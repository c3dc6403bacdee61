//! Command line front end of the `safe_multisig` crate.

pub mod cmd;
pub mod logging;
pub mod runner;
