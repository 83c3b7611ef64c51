//! Validated network configuration for the deploy run

use std::str::FromStr;

use alloy::{
    primitives::Address, signers::local::PrivateKeySigner, transports::http::reqwest::Url,
};

use crate::{cli::NetworkArgs, errors::ScriptError};

/// The endpoint, chain and account a run is executed with
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// The RPC endpoint of the node
    pub rpc_url: Url,
    /// The chain ID transactions are signed for
    pub chain_id: u64,
    /// The address transactions are sent from
    pub sender: Address,
    /// The signer holding the sender's private key
    pub signer: PrivateKeySigner,
}

impl TryFrom<&NetworkArgs> for NetworkConfig {
    type Error = ScriptError;

    fn try_from(args: &NetworkArgs) -> Result<Self, Self::Error> {
        let rpc_url = Url::parse(&args.rpc_url)
            .map_err(|e| ScriptError::Config(format!("RPC URL {}: {}", args.rpc_url, e)))?;

        let sender = Address::from_str(&args.address)
            .map_err(|e| ScriptError::Config(format!("sender address {}: {}", args.address, e)))?;

        // Never echo the key itself
        let signer = PrivateKeySigner::from_str(&args.priv_key)
            .map_err(|e| ScriptError::Config(format!("private key: {}", e)))?;

        if signer.address() != sender {
            return Err(ScriptError::Config(format!(
                "private key belongs to {:#x}, not the configured sender {:#x}",
                signer.address(),
                sender
            )));
        }

        Ok(Self {
            rpc_url,
            chain_id: args.chain_id,
            sender,
            signer,
        })
    }
}
