//! The deployed storage contract: its deployment, and the `retrieve` / `store`
//! methods called on it through the ABI produced by the compiler

use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    json_abi::{Function, JsonAbi},
    network::TransactionBuilder,
    primitives::{Address, Bytes, U256},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tracing::info;

use crate::{
    artifact::ContractArtifact,
    client::ScriptClient,
    constants::{RETRIEVE_METHOD, STORE_METHOD},
    errors::ScriptError,
};

/// Build the deployment transaction for an artifact whose constructor takes no
/// arguments
pub fn deploy_request(
    client: &ScriptClient,
    artifact: &ContractArtifact,
    nonce: u64,
) -> Result<TransactionRequest, ScriptError> {
    if let Some(constructor) = artifact.abi.constructor() {
        if !constructor.inputs.is_empty() {
            return Err(ScriptError::CalldataConstruction(format!(
                "constructor of {} expects {} arguments, none are supported",
                artifact.name,
                constructor.inputs.len()
            )));
        }
    }

    Ok(client
        .request(nonce)
        .with_deploy_code(artifact.bytecode.clone()))
}

/// Deploy the artifact with the given nonce and wait for the deployment receipt
pub async fn deploy(
    client: &ScriptClient,
    artifact: &ContractArtifact,
    nonce: u64,
) -> Result<(DeployedContract, TransactionReceipt), ScriptError> {
    let tx = deploy_request(client, artifact, nonce)?;
    let receipt = client.send(tx, ScriptError::ContractDeployment).await?;

    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::ContractDeployment(format!(
            "receipt for {} has no contract address",
            receipt.transaction_hash
        ))
    })?;
    info!("{} deployed at {:#x}", artifact.name, address);

    Ok((DeployedContract::new(address, artifact.abi.clone()), receipt))
}

/// A contract instance: its address and ABI
#[derive(Debug, Clone)]
pub struct DeployedContract {
    /// The address of the contract
    address: Address,
    /// The ABI of the contract
    abi: JsonAbi,
}

impl DeployedContract {
    /// An instance at `address` with the given ABI
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    /// The address of the contract
    pub fn address(&self) -> Address {
        self.address
    }

    /// Look up a function by name, taking the first overload
    fn function(&self, method: &str) -> Result<&Function, ScriptError> {
        self.abi
            .function(method)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| {
                ScriptError::CalldataConstruction(format!("no function `{method}` in the ABI"))
            })
    }

    /// ABI-encode a call to `method`, selector included
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let data = self
            .function(method)?
            .abi_encode_input(args)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{method}: {e}")))?;

        Ok(data.into())
    }

    /// Decode the output of `method`, expecting a single unsigned integer
    pub fn decode_uint(&self, method: &str, output: &[u8]) -> Result<U256, ScriptError> {
        let values = self
            .function(method)?
            .abi_decode_output(output)
            .map_err(|e| ScriptError::ContractInteraction(format!("decoding {method}: {e}")))?;

        match values.as_slice() {
            [value] => value.as_uint().map(|(uint, _)| uint).ok_or_else(|| {
                ScriptError::ContractInteraction(format!("{method} did not return a uint"))
            }),
            _ => Err(ScriptError::ContractInteraction(format!(
                "{method} returned {} values, expected one",
                values.len()
            ))),
        }
    }

    /// Read the stored value with an `eth_call`
    pub async fn retrieve(&self, client: &ScriptClient) -> Result<U256, ScriptError> {
        let data = self.encode_call(RETRIEVE_METHOD, &[])?;
        let output = client.call(self.address, data).await?;

        self.decode_uint(RETRIEVE_METHOD, &output)
    }

    /// Build the transaction storing `value`, sent with the given nonce
    pub fn store_request(
        &self,
        client: &ScriptClient,
        value: U256,
        nonce: u64,
    ) -> Result<TransactionRequest, ScriptError> {
        let data = self.encode_call(STORE_METHOD, &[DynSolValue::Uint(value, 256)])?;

        Ok(client
            .request(nonce)
            .with_to(self.address)
            .with_input(data))
    }

    /// Store `value` with the given nonce and wait for the receipt
    pub async fn store(
        &self,
        client: &ScriptClient,
        value: U256,
        nonce: u64,
    ) -> Result<TransactionReceipt, ScriptError> {
        let tx = self.store_request(client, value, nonce)?;
        client.send(tx, ScriptError::ContractInteraction).await
    }
}
