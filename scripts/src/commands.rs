//! Implementations of the compile and round-trip scripts

use std::time::Duration;

use alloy::primitives::U256;
use tracing::info;

use crate::{
    artifact::{write_compiler_output, ContractArtifact},
    cli::{CompileArgs, RunArgs},
    client::{setup_client, FeeMode, ScriptClient},
    config::NetworkConfig,
    contract::deploy,
    errors::ScriptError,
    solc::{Solc, StandardJsonInput},
    types::{NonceSequence, RoundTripReport},
};

/// Compile the source, persist the full compiler output, and extract the
/// requested contract
pub async fn compile(args: &CompileArgs) -> Result<ContractArtifact, ScriptError> {
    let input = StandardJsonInput::from_source_file(&args.source)?;
    let solc = Solc::find(&args.solc_version, args.solc.as_deref(), !args.no_install).await?;

    info!(
        "Compiling {} with solc {} ({})...",
        input.source_name(),
        solc.version(),
        solc.path().display()
    );
    let output = solc.compile(&input)?;

    write_compiler_output(&args.artifact, &output)?;
    info!("Compiler output written to {}", args.artifact.display());

    let artifact = ContractArtifact::extract(&output, input.source_name(), &args.contract)?;
    info!(
        "Extracted {}: {} bytes of bytecode, {} functions",
        artifact.name,
        artifact.bytecode.len(),
        artifact.abi.functions().count()
    );

    Ok(artifact)
}

/// Compile, deploy, read, update, and read again
pub async fn run(args: RunArgs) -> Result<RoundTripReport, ScriptError> {
    let artifact = compile(&args.compile).await?;

    let config = NetworkConfig::try_from(&args.network)?;
    let fee_mode = if args.legacy {
        FeeMode::Legacy
    } else {
        FeeMode::Eip1559
    };
    let client = setup_client(
        &config,
        fee_mode,
        args.receipt_timeout.map(Duration::from_secs),
    )
    .await?;

    let nonces = client.nonce_sequence().await?;
    let report = round_trip(&client, &artifact, U256::from(args.value), nonces).await?;
    info!("Round trip complete\n{report}");

    Ok(report)
}

/// Deploy the artifact and round-trip `value` through it.
///
/// The deployment uses the first nonce of `nonces` and the update the second;
/// no other transaction from the sender may land in between.
pub async fn round_trip(
    client: &ScriptClient,
    artifact: &ContractArtifact,
    value: U256,
    mut nonces: NonceSequence,
) -> Result<RoundTripReport, ScriptError> {
    let deploy_nonce = nonces.next_nonce();
    info!("Deploying contract (nonce {deploy_nonce})...");
    let (contract, deploy_receipt) = deploy(client, artifact, deploy_nonce).await?;
    info!("Deployed!");

    let initial_value = contract.retrieve(client).await?;
    info!("Stored value: {initial_value}");

    let update_nonce = nonces.next_nonce();
    info!("Updating contract (nonce {update_nonce})...");
    let store_receipt = contract.store(client, value, update_nonce).await?;
    info!("Updated!");

    let updated_value = contract.retrieve(client).await?;
    info!("Stored value: {updated_value}");

    Ok(RoundTripReport {
        contract_address: contract.address(),
        deploy_nonce,
        deploy_tx: deploy_receipt.transaction_hash,
        initial_value,
        update_nonce,
        update_tx: store_receipt.transaction_hash,
        updated_value,
    })
}
