//! Constants used in the storage scripts

/// The default path of the Solidity source file, relative to the working directory
pub const DEFAULT_SOURCE_PATH: &str = "./SimpleStorage.sol";

/// The default name of the contract extracted from the compiler output
pub const DEFAULT_CONTRACT_NAME: &str = "SimpleStorage";

/// The default path to which the full compiler output is written
pub const DEFAULT_ARTIFACT_PATH: &str = "compiled_code.json";

/// The compiler version the source is compiled with
pub const DEFAULT_SOLC_VERSION: &str = "0.8.0";

/// The value written to the contract by the update transaction
pub const DEFAULT_STORE_VALUE: u64 = 5;

/// The source language passed in the standard-JSON input
pub const SOLIDITY_LANGUAGE: &str = "Solidity";

/// The per-contract outputs requested from the compiler
pub const OUTPUT_SELECTION: [&str; 4] = [
    "abi",
    "metadata",
    "evm.bytecode",
    "evm.bytecode.sourceMap",
];

/// The wildcard selecting every file / contract in an output selection
pub const OUTPUT_SELECTION_WILDCARD: &str = "*";

/// The name of the `solc` command
pub const SOLC_COMMAND: &str = "solc";

/// The flag putting `solc` into standard-JSON mode
pub const STANDARD_JSON_FLAG: &str = "--standard-json";

/// The flag asking `solc` for its version
pub const VERSION_FLAG: &str = "--version";

/// The prefix of the version line printed by `solc --version`
pub const SOLC_VERSION_PREFIX: &str = "Version:";

/// The name of the environment variable pointing to the user's home directory
pub const HOME_ENV_VAR: &str = "HOME";

/// The directory under `$HOME` in which `svm` installs compilers
pub const SVM_INSTALL_DIR: &str = ".svm";

/// The directory under `$HOME` in which `solcx` installs compilers
pub const SOLCX_INSTALL_DIR: &str = ".solcx";

/// The getter method of the storage contract
pub const RETRIEVE_METHOD: &str = "retrieve";

/// The setter method of the storage contract
pub const STORE_METHOD: &str = "store";

/// The environment variable holding the RPC URL
pub const RPC_URL_ENV_VAR: &str = "BLOCKCHAIN_NETWORK";

/// The environment variable holding the chain ID
pub const CHAIN_ID_ENV_VAR: &str = "CHAIN_ID";

/// The environment variable holding the sender address
pub const ADDRESS_ENV_VAR: &str = "PUBLIC_KEY";

/// The environment variable holding the sender's private key
pub const PRIV_KEY_ENV_VAR: &str = "PRIVATE_KEY";
