//! Persisting the compiler output and extracting a single contract from it

use std::{fs, path::Path};

use alloy::{hex, json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;

use crate::{errors::ScriptError, solc::CompilerOutput};

/// Write the full compiler output to `path`, replacing any previous file
pub fn write_compiler_output(path: &Path, output: &CompilerOutput) -> Result<(), ScriptError> {
    let bytes = serde_json::to_vec(output.raw())
        .map_err(|e| ScriptError::WriteArtifact(e.to_string()))?;

    fs::write(path, bytes)
        .map_err(|e| ScriptError::WriteArtifact(format!("{}: {}", path.display(), e)))
}

/// The subset of a contract's compiler output needed to deploy and call it
#[derive(Deserialize)]
struct ContractOutput {
    /// The contract ABI
    #[serde(default)]
    abi: Option<JsonAbi>,
    /// The EVM outputs
    #[serde(default)]
    evm: Option<EvmOutput>,
}

/// The `evm` section of a contract's compiler output
#[derive(Deserialize)]
struct EvmOutput {
    /// The creation bytecode
    #[serde(default)]
    bytecode: Option<BytecodeOutput>,
}

/// The `evm.bytecode` section of a contract's compiler output
#[derive(Deserialize)]
struct BytecodeOutput {
    /// The bytecode as a hex string without prefix
    object: String,
}

/// The ABI and creation bytecode of one compiled contract
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The contract name
    pub name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Pull the named contract out of the compiler output
    pub fn extract(
        output: &CompilerOutput,
        source_name: &str,
        contract_name: &str,
    ) -> Result<Self, ScriptError> {
        let contract = output
            .raw()
            .get("contracts")
            .and_then(|contracts| contracts.get(source_name))
            .and_then(|source| source.get(contract_name))
            .ok_or_else(|| {
                ScriptError::MissingContract(format!("{contract_name} in {source_name}"))
            })?;

        let contract = ContractOutput::deserialize(contract)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        let abi = contract.abi.ok_or_else(|| {
            ScriptError::ArtifactParsing(format!("no ABI in output for {contract_name}"))
        })?;

        let object = contract
            .evm
            .and_then(|evm| evm.bytecode)
            .map(|bytecode| bytecode.object)
            .ok_or_else(|| {
                ScriptError::ArtifactParsing(format!("no bytecode in output for {contract_name}"))
            })?;

        if object.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{contract_name} has empty bytecode, is it abstract or an interface?"
            )));
        }

        let bytecode = hex::decode(&object)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{contract_name} bytecode: {e}")))?;

        Ok(Self {
            name: contract_name.to_string(),
            abi,
            bytecode: bytecode.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A compiler output for a source containing `SimpleStorage`, a contract
    /// with a constructor argument and an interface
    const FIXTURE: &str = include_str!("../testdata/compiler_output.json");

    fn fixture() -> CompilerOutput {
        CompilerOutput::from_json(serde_json::from_str(FIXTURE).unwrap()).unwrap()
    }

    #[test]
    fn test_extract_simple_storage() {
        let artifact =
            ContractArtifact::extract(&fixture(), "SimpleStorage.sol", "SimpleStorage").unwrap();

        assert_eq!(artifact.name, "SimpleStorage");
        assert!(artifact.abi.function("retrieve").is_some());
        assert!(artifact.abi.function("store").is_some());
        assert_eq!(&artifact.bytecode[..4], &[0x60, 0x80, 0x60, 0x40]);
    }

    #[test]
    fn test_extract_missing_contract() {
        let res = ContractArtifact::extract(&fixture(), "SimpleStorage.sol", "Storage");
        assert!(matches!(res, Err(ScriptError::MissingContract(_))));

        let res = ContractArtifact::extract(&fixture(), "Other.sol", "SimpleStorage");
        assert!(matches!(res, Err(ScriptError::MissingContract(_))));
    }

    #[test]
    fn test_extract_interface_rejected() {
        let res = ContractArtifact::extract(&fixture(), "SimpleStorage.sol", "IStorage");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiled_code.json");
        fs::write(&path, "stale contents that are longer than nothing").unwrap();

        let output = fixture();
        write_compiler_output(&path, &output).unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(&written, output.raw());
    }
}
