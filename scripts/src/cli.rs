//! Definitions of CLI arguments and commands for the storage scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{compile, run},
    constants::{
        ADDRESS_ENV_VAR, CHAIN_ID_ENV_VAR, DEFAULT_ARTIFACT_PATH, DEFAULT_CONTRACT_NAME,
        DEFAULT_SOLC_VERSION, DEFAULT_SOURCE_PATH, DEFAULT_STORE_VALUE, PRIV_KEY_ENV_VAR,
        RPC_URL_ENV_VAR,
    },
    errors::ScriptError,
};

/// Compile the storage contract, deploy it, and round-trip a value through it
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// The commands supported by the scripts
#[derive(Subcommand)]
pub enum Command {
    /// Compile the contract and write the compiler output, without touching the network
    Compile(CompileArgs),
    /// Compile, deploy, read, update and read again
    Run(RunArgs),
}

impl Command {
    /// Execute the command
    pub async fn run(self) -> Result<(), ScriptError> {
        match self {
            Command::Compile(args) => compile(&args).await.map(|_| ()),
            Command::Run(args) => run(args).await.map(|_| ()),
        }
    }
}

/// Arguments controlling compilation
#[derive(Args, Clone, Debug)]
pub struct CompileArgs {
    /// Path to the Solidity source file
    #[arg(long, env = "CONTRACT_SOURCE", default_value = DEFAULT_SOURCE_PATH)]
    pub source: PathBuf,

    /// Name of the contract to extract from the compiler output
    #[arg(long, env = "CONTRACT_NAME", default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Path the full compiler output is written to
    #[arg(long, env = "COMPILED_ARTIFACT", default_value = DEFAULT_ARTIFACT_PATH)]
    pub artifact: PathBuf,

    /// The compiler version the source must be compiled with
    #[arg(long, env = "SOLC_VERSION", default_value = DEFAULT_SOLC_VERSION)]
    pub solc_version: String,

    /// Explicit path to a `solc` binary, skipping the installed-compiler lookup
    #[arg(long, env = "SOLC")]
    pub solc: Option<PathBuf>,

    /// Fail instead of installing the pinned compiler when it is not found
    #[arg(long)]
    pub no_install: bool,
}

/// Arguments identifying the network and the sending account
#[derive(Args, Clone, Debug)]
pub struct NetworkArgs {
    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR)]
    pub rpc_url: String,

    /// Chain ID of the network
    #[arg(long, env = CHAIN_ID_ENV_VAR)]
    pub chain_id: u64,

    /// Address of the sending account
    #[arg(short, long, env = ADDRESS_ENV_VAR)]
    pub address: String,

    /// Private key of the sending account
    // TODO: Support keystore files instead of raw keys
    #[arg(short, long, env = PRIV_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: String,
}

/// Arguments for the full compile / deploy / round-trip run
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Compilation arguments
    #[command(flatten)]
    pub compile: CompileArgs,

    /// Network and account arguments
    #[command(flatten)]
    pub network: NetworkArgs,

    /// The value written by the update transaction
    #[arg(long, default_value_t = DEFAULT_STORE_VALUE)]
    pub value: u64,

    /// Price transactions with a legacy `gasPrice` instead of EIP-1559 fees
    #[arg(long)]
    pub legacy: bool,

    /// Seconds to wait for each receipt; waits indefinitely when unset
    #[arg(long)]
    pub receipt_timeout: Option<u64>,
}
