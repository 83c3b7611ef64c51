//! The RPC client used to fetch nonces, sign and submit transactions, and make
//! read-only calls

use std::time::Duration;

use alloy::{
    consensus::TxEnvelope,
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tracing::{debug, info};

use crate::{config::NetworkConfig, errors::ScriptError, types::NonceSequence};

/// The provider type used by the scripts
pub type RpcProvider = DynProvider<Ethereum>;

/// How transaction fees are priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeMode {
    /// `maxFeePerGas` / `maxPriorityFeePerGas`, estimated from fee history
    #[default]
    Eip1559,
    /// A single `gasPrice`, for nodes without EIP-1559 support
    Legacy,
}

/// A provider bound to one sending account.
///
/// The provider has no fillers: nonce, chain ID, gas and fees are set here
/// explicitly so that the nonce sequencing stays under the caller's control.
pub struct ScriptClient {
    /// The underlying provider
    provider: RpcProvider,
    /// The wallet signing transactions for `sender`
    wallet: EthereumWallet,
    /// The sending account
    sender: Address,
    /// The chain ID transactions are signed for
    chain_id: u64,
    /// How fees are priced
    fee_mode: FeeMode,
    /// How long to wait for a receipt, forever if unset
    receipt_timeout: Option<Duration>,
}

/// Sets up a client for the configured network, checking that the node serves
/// the configured chain
pub async fn setup_client(
    config: &NetworkConfig,
    fee_mode: FeeMode,
    receipt_timeout: Option<Duration>,
) -> Result<ScriptClient, ScriptError> {
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(config.rpc_url.clone());
    let provider = DynProvider::new(provider);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    if chain_id != config.chain_id {
        return Err(ScriptError::ClientInitialization(format!(
            "configured chain ID {} but node reports {}",
            config.chain_id, chain_id
        )));
    }

    Ok(ScriptClient::new(
        provider,
        EthereumWallet::from(config.signer.clone()),
        config.sender,
        chain_id,
        fee_mode,
        receipt_timeout,
    ))
}

impl ScriptClient {
    /// A client over an existing provider. The chain ID is taken as given.
    pub fn new(
        provider: RpcProvider,
        wallet: EthereumWallet,
        sender: Address,
        chain_id: u64,
        fee_mode: FeeMode,
        receipt_timeout: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            wallet,
            sender,
            chain_id,
            fee_mode,
            receipt_timeout,
        }
    }

    /// The sending account
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The chain ID transactions are signed for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The underlying provider
    pub fn provider(&self) -> &RpcProvider {
        &self.provider
    }

    /// Fetch the sender's transaction count once and start a nonce sequence at it
    pub async fn nonce_sequence(&self) -> Result<NonceSequence, ScriptError> {
        let count = self
            .provider
            .get_transaction_count(self.sender)
            .await
            .map_err(|e| ScriptError::NonceFetching(e.to_string()))?;
        debug!("transaction count of {:#x} is {}", self.sender, count);

        Ok(NonceSequence::starting_at(count))
    }

    /// A transaction request from the sender, for this chain, with the given nonce
    pub fn request(&self, nonce: u64) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.sender)
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
    }

    /// Estimate gas and fees for the request and sign it
    pub async fn sign(&self, tx: TransactionRequest) -> Result<TxEnvelope, ScriptError> {
        let gas_limit = self
            .provider
            .estimate_gas(tx.clone())
            .await
            .map_err(|e| ScriptError::TransactionSigning(format!("estimating gas: {e}")))?;
        let tx = tx.with_gas_limit(gas_limit);

        let tx = match self.fee_mode {
            FeeMode::Eip1559 => {
                let fees = self
                    .provider
                    .estimate_eip1559_fees()
                    .await
                    .map_err(|e| ScriptError::TransactionSigning(format!("estimating fees: {e}")))?;
                tx.with_max_fee_per_gas(fees.max_fee_per_gas)
                    .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            }
            FeeMode::Legacy => {
                let gas_price = self.provider.get_gas_price().await.map_err(|e| {
                    ScriptError::TransactionSigning(format!("fetching gas price: {e}"))
                })?;
                tx.with_gas_price(gas_price)
            }
        };

        tx.build(&self.wallet)
            .await
            .map_err(|e| ScriptError::TransactionSigning(e.to_string()))
    }

    /// Submit a signed transaction and block until its receipt is available.
    ///
    /// Transport failures are reported with `on_error`; a receipt with a failed
    /// status is a [`ScriptError::TransactionReverted`].
    pub async fn submit(
        &self,
        envelope: TxEnvelope,
        on_error: fn(String) -> ScriptError,
    ) -> Result<TransactionReceipt, ScriptError> {
        let pending = self
            .provider
            .send_tx_envelope(envelope)
            .await
            .map_err(|e| on_error(e.to_string()))?;
        info!("submitted transaction {}", pending.tx_hash());

        let receipt = pending
            .with_timeout(self.receipt_timeout)
            .get_receipt()
            .await
            .map_err(|e| on_error(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::TransactionReverted(format!(
                "{} in block {:?}",
                receipt.transaction_hash, receipt.block_number
            )));
        }

        Ok(receipt)
    }

    /// Sign and submit a request, blocking until its receipt is available
    pub async fn send(
        &self,
        tx: TransactionRequest,
        on_error: fn(String) -> ScriptError,
    ) -> Result<TransactionReceipt, ScriptError> {
        let envelope = self.sign(tx).await?;
        self.submit(envelope, on_error).await
    }

    /// Execute a read-only call against `to`, returning the raw output
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    //! A client over a mocked transport

    use std::str::FromStr;

    use alloy::{
        providers::{mock::Asserter, Provider, ProviderBuilder},
        signers::local::PrivateKeySigner,
    };

    use super::*;

    /// The first default account of an Anvil node
    const ANVIL_PKEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// The chain ID the mocked client signs for
    pub const MOCK_CHAIN_ID: u64 = 31337;

    /// A client whose RPC responses are served, in order, by `asserter`
    pub fn mocked_client(asserter: Asserter, fee_mode: FeeMode) -> ScriptClient {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter)
            .erased();
        let signer = PrivateKeySigner::from_str(ANVIL_PKEY).unwrap();

        ScriptClient::new(
            provider,
            EthereumWallet::from(signer.clone()),
            signer.address(),
            MOCK_CHAIN_ID,
            fee_mode,
            None,
        )
    }
}
