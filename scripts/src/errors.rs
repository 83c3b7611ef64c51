//! Definitions of errors that can occur while compiling, deploying and
//! exercising the storage contract

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the storage scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading the Solidity source file
    ReadSource(String),
    /// No usable `solc` binary could be located or spawned
    CompilerNotFound(String),
    /// The pinned `solc` version could not be installed
    CompilerInstallation(String),
    /// The located `solc` binary does not match the pinned version
    CompilerVersion(String),
    /// The compiler failed or reported errors
    ContractCompilation(String),
    /// Error writing the compiler output to disk
    WriteArtifact(String),
    /// Error parsing the compiler output
    ArtifactParsing(String),
    /// The requested contract is absent from the compiler output
    MissingContract(String),
    /// Invalid network configuration
    Config(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error fetching the nonce of the sender
    NonceFetching(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error filling in or signing a transaction
    TransactionSigning(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// A transaction was mined but reverted
    TransactionReverted(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadSource(s) => write!(f, "error reading contract source: {}", s),
            ScriptError::CompilerNotFound(s) => write!(f, "error locating compiler: {}", s),
            ScriptError::CompilerInstallation(s) => {
                write!(f, "error installing compiler: {}", s)
            }
            ScriptError::CompilerVersion(s) => write!(f, "compiler version mismatch: {}", s),
            ScriptError::ContractCompilation(s) => write!(f, "error compiling contract: {}", s),
            ScriptError::WriteArtifact(s) => write!(f, "error writing compiler output: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::MissingContract(s) => write!(f, "contract not found: {}", s),
            ScriptError::Config(s) => write!(f, "invalid configuration: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::NonceFetching(s) => write!(f, "error fetching nonce: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::TransactionSigning(s) => write!(f, "error signing transaction: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::TransactionReverted(s) => write!(f, "transaction reverted: {}", s),
        }
    }
}

impl Error for ScriptError {}
