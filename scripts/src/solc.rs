//! Locating and invoking the Solidity compiler in standard-JSON mode.
//!
//! A binary matching the pinned version is resolved from an explicit path, the
//! `svm` / `solcx` install directories or the `PATH`, and installed with `svm`
//! when none is found. It is fed a `solc --standard-json` input and the
//! reported diagnostics are turned into a pass / fail result.

use std::{
    collections::BTreeMap,
    env, fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    constants::{
        HOME_ENV_VAR, OUTPUT_SELECTION, OUTPUT_SELECTION_WILDCARD, SOLCX_INSTALL_DIR,
        SOLC_COMMAND, SOLC_VERSION_PREFIX, SOLIDITY_LANGUAGE, STANDARD_JSON_FLAG, SVM_INSTALL_DIR,
        VERSION_FLAG,
    },
    errors::ScriptError,
};

// ---------
// | Input |
// ---------

/// A `solc --standard-json` input compiling a single source file
#[derive(Debug, Clone, Serialize)]
pub struct StandardJsonInput {
    /// The name the single source is compiled under
    #[serde(skip)]
    source_name: String,
    /// The source language
    language: String,
    /// The sources to compile, keyed by source name
    sources: BTreeMap<String, SourceInput>,
    /// The compiler settings
    settings: Settings,
}

/// The content of a single source file
#[derive(Debug, Clone, Serialize)]
struct SourceInput {
    /// The Solidity source text
    content: String,
}

/// The compiler settings sent with every compilation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Settings {
    /// file -> contract -> requested outputs
    output_selection: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl StandardJsonInput {
    /// Build an input compiling `content` under the given source name, requesting
    /// the ABI, metadata, bytecode and bytecode source map of every contract
    pub fn new(source_name: impl Into<String>, content: impl Into<String>) -> Self {
        let source_name = source_name.into();
        let sources = BTreeMap::from([(
            source_name.clone(),
            SourceInput {
                content: content.into(),
            },
        )]);

        let outputs = OUTPUT_SELECTION.iter().map(|s| s.to_string()).collect();
        let per_contract = BTreeMap::from([(OUTPUT_SELECTION_WILDCARD.to_string(), outputs)]);
        let output_selection =
            BTreeMap::from([(OUTPUT_SELECTION_WILDCARD.to_string(), per_contract)]);

        Self {
            source_name,
            language: SOLIDITY_LANGUAGE.to_string(),
            sources,
            settings: Settings { output_selection },
        }
    }

    /// Read a Solidity file from disk, naming the source after the file name
    pub fn from_source_file(path: &Path) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ScriptError::ReadSource(format!("{}: {}", path.display(), e)))?;

        let source_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ScriptError::ReadSource(format!("{} has no usable file name", path.display()))
            })?;

        Ok(Self::new(source_name, content))
    }

    /// The name of the source being compiled
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}

// ----------
// | Output |
// ----------

/// The severity of a compiler diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Compilation failed
    Error,
    /// Compilation succeeded with a warning
    Warning,
    /// Informational message
    Info,
}

/// A single entry of the `errors` array in the compiler output
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// The severity of the diagnostic
    pub severity: Severity,
    /// The diagnostic type, e.g. `TypeError` or `Warning`
    #[serde(rename = "type")]
    pub kind: String,
    /// The short message
    pub message: String,
    /// The message with source location, as printed by the CLI
    #[serde(default)]
    pub formatted_message: Option<String>,
}

impl Diagnostic {
    /// A human-readable rendering of the diagnostic
    pub fn render(&self) -> String {
        match &self.formatted_message {
            Some(formatted) => formatted.trim_end().to_string(),
            None => format!("{}: {}", self.kind, self.message),
        }
    }
}

/// The compiler output: the raw JSON, kept whole for persistence, plus the
/// parsed diagnostics
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// The output exactly as emitted by the compiler
    raw: Value,
    /// The diagnostics reported by the compiler
    diagnostics: Vec<Diagnostic>,
}

impl CompilerOutput {
    /// Wrap a raw compiler output, parsing its `errors` array
    pub fn from_json(raw: Value) -> Result<Self, ScriptError> {
        let diagnostics = match raw.get("errors") {
            Some(errors) => Vec::<Diagnostic>::deserialize(errors)
                .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?,
            None => Vec::new(),
        };

        Ok(Self { raw, diagnostics })
    }

    /// The raw compiler output
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// All diagnostics of the given severity
    pub fn diagnostics(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }

    /// Fail if the compiler reported any error, logging warnings along the way
    pub fn ensure_success(&self) -> Result<(), ScriptError> {
        for warning in self.diagnostics(Severity::Warning) {
            warn!("{}", warning.render());
        }

        let errors: Vec<String> = self
            .diagnostics(Severity::Error)
            .map(Diagnostic::render)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::ContractCompilation(errors.join("\n")))
        }
    }
}

// ------------
// | Compiler |
// ------------

/// A `solc` binary verified to report the pinned version
#[derive(Debug, Clone)]
pub struct Solc {
    /// Path to the binary
    path: PathBuf,
    /// The version the binary reports, without build metadata
    version: String,
}

impl Solc {
    /// Locate a compiler for `version`.
    ///
    /// An explicit path wins; otherwise a compiler installed by `svm` or `solcx`
    /// is preferred over `solc` on the `PATH`. If neither reports `version` and
    /// `install` is set, the compiler is installed with `svm`.
    pub async fn find(
        version: &str,
        explicit: Option<&Path>,
        install: bool,
    ) -> Result<Self, ScriptError> {
        if let Some(path) = explicit {
            return Self::at(path, version);
        }

        let home = env::var_os(HOME_ENV_VAR).map(PathBuf::from);
        let installed = installed_compiler(home.as_deref(), version).or_else(|| {
            Some(svm::version_binary(version)).filter(|path| path.is_file())
        });

        Self::locate(version, installed, Path::new(SOLC_COMMAND), install).await
    }

    /// Use `installed` if present, then `fallback`, then install `version`
    async fn locate(
        version: &str,
        installed: Option<PathBuf>,
        fallback: &Path,
        install: bool,
    ) -> Result<Self, ScriptError> {
        if let Some(path) = installed {
            return Self::at(&path, version);
        }

        let err = match Self::at(fallback, version) {
            Ok(solc) => return Ok(solc),
            Err(e) => e,
        };
        if !install {
            return Err(err);
        }

        info!("No solc {version} available ({err}), installing...");
        let path = install_compiler(version).await?;
        info!("Installed solc {version} at {}", path.display());

        Self::at(&path, version)
    }

    /// The binary at `path`, which must report exactly `version`
    fn at(path: &Path, version: &str) -> Result<Self, ScriptError> {
        debug!("using compiler at {}", path.display());
        let path = path.to_path_buf();

        let found = query_version(&path)?;
        if found != version {
            return Err(ScriptError::CompilerVersion(format!(
                "expected {}, {} reports {}",
                version,
                path.display(),
                found
            )));
        }

        Ok(Self {
            path,
            version: found,
        })
    }

    /// The path of the binary
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The version of the binary
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Run the compiler on the given input.
    ///
    /// Fails if the process cannot be run, exits unsuccessfully, or reports any
    /// diagnostic of severity `error`.
    pub fn compile(&self, input: &StandardJsonInput) -> Result<CompilerOutput, ScriptError> {
        let input_bytes = serde_json::to_vec(input)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;

        let mut child = Command::new(&self.path)
            .arg(STANDARD_JSON_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScriptError::CompilerNotFound(format!("{}: {}", self.path.display(), e)))?;

        // Dropping the handle closes stdin, which `solc` waits for
        child
            .stdin
            .take()
            .ok_or_else(|| ScriptError::ContractCompilation("compiler stdin unavailable".into()))?
            .write_all(&input_bytes)
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;

        let output = child
            .wait_with_output()
            .map_err(|e| ScriptError::ContractCompilation(e.to_string()))?;

        if !output.status.success() {
            return Err(ScriptError::ContractCompilation(format!(
                "solc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
        let output = CompilerOutput::from_json(raw)?;
        output.ensure_success()?;

        Ok(output)
    }
}

/// Look for a compiler of the given version in the `svm` and `solcx` install
/// directories under `home`
fn installed_compiler(home: Option<&Path>, version: &str) -> Option<PathBuf> {
    let home = home?;
    let candidates = [
        home.join(SVM_INSTALL_DIR)
            .join(version)
            .join(format!("solc-{version}")),
        home.join(SOLCX_INSTALL_DIR).join(format!("solc-v{version}")),
    ];

    candidates.into_iter().find(|path| path.is_file())
}

/// Download `version` into the `svm` data directory, returning the binary path
async fn install_compiler(version: &str) -> Result<PathBuf, ScriptError> {
    let parsed = semver::Version::parse(version)
        .map_err(|e| ScriptError::CompilerInstallation(format!("{version}: {e}")))?;

    svm::install(&parsed)
        .await
        .map_err(|e| ScriptError::CompilerInstallation(format!("solc {version}: {e}")))
}

/// Ask the binary at `path` for its version
fn query_version(path: &Path) -> Result<String, ScriptError> {
    let output = Command::new(path)
        .arg(VERSION_FLAG)
        .output()
        .map_err(|e| ScriptError::CompilerNotFound(format!("{}: {}", path.display(), e)))?;

    if !output.status.success() {
        return Err(ScriptError::CompilerNotFound(format!(
            "{} --version exited with {}",
            path.display(),
            output.status
        )));
    }

    parse_version(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        ScriptError::CompilerNotFound(format!(
            "could not parse version reported by {}",
            path.display()
        ))
    })
}

/// Parse the semantic version out of `solc --version` output, dropping
/// pre-release and build metadata
fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(SOLC_VERSION_PREFIX))
        .and_then(|rest| rest.trim().split(|c| c == '+' || c == '-').next())
        .filter(|version| !version.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_release_version() {
        let stdout = "solc, the solidity compiler commandline interface\n\
                      Version: 0.8.0+commit.c7dfd78e.Linux.g++\n";
        assert_eq!(parse_version(stdout).as_deref(), Some("0.8.0"));
    }

    #[test]
    fn test_parse_prerelease_version() {
        let stdout = "Version: 0.8.1-develop.2021.1.1+commit.aaaaaaaa.mod.Darwin.appleclang";
        assert_eq!(parse_version(stdout).as_deref(), Some("0.8.1"));
    }

    #[test]
    fn test_parse_version_missing() {
        assert_eq!(parse_version("solc, the solidity compiler"), None);
        assert_eq!(parse_version("Version: "), None);
    }

    #[test]
    fn test_input_shape() {
        let input = StandardJsonInput::new("SimpleStorage.sol", "contract A {}");
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(
            value,
            json!({
                "language": "Solidity",
                "sources": { "SimpleStorage.sol": { "content": "contract A {}" } },
                "settings": {
                    "outputSelection": {
                        "*": {
                            "*": ["abi", "metadata", "evm.bytecode", "evm.bytecode.sourceMap"]
                        }
                    }
                }
            })
        );
        assert_eq!(input.source_name(), "SimpleStorage.sol");
    }

    #[test]
    fn test_input_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = StandardJsonInput::from_source_file(&dir.path().join("Missing.sol"));
        assert!(matches!(res, Err(ScriptError::ReadSource(_))));
    }

    #[test]
    fn test_input_from_file_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Storage.sol");
        fs::write(&path, "contract Storage {}").unwrap();

        let input = StandardJsonInput::from_source_file(&path).unwrap();
        assert_eq!(input.source_name(), "Storage.sol");
    }

    #[test]
    fn test_output_without_errors_succeeds() {
        let output = CompilerOutput::from_json(json!({ "contracts": {}, "sources": {} })).unwrap();
        assert!(output.ensure_success().is_ok());
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let output = CompilerOutput::from_json(json!({
            "errors": [{
                "severity": "warning",
                "type": "Warning",
                "component": "general",
                "message": "SPDX license identifier not provided in source file."
            }]
        }))
        .unwrap();

        assert_eq!(output.diagnostics(Severity::Warning).count(), 1);
        assert!(output.ensure_success().is_ok());
    }

    #[test]
    fn test_errors_fail_with_all_messages() {
        let output = CompilerOutput::from_json(json!({
            "errors": [
                {
                    "severity": "error",
                    "type": "ParserError",
                    "message": "Expected ';' but got '}'",
                    "formattedMessage": "ParserError: Expected ';' but got '}'\n --> A.sol:3:1:\n"
                },
                {
                    "severity": "error",
                    "type": "DeclarationError",
                    "message": "Undeclared identifier."
                }
            ]
        }))
        .unwrap();

        match output.ensure_success() {
            Err(ScriptError::ContractCompilation(msg)) => {
                assert!(msg.contains("ParserError: Expected ';' but got '}'"));
                assert!(msg.contains("DeclarationError: Undeclared identifier."));
            }
            other => panic!("expected compilation error, got {other:?}"),
        }
    }

    /// Write an executable at `path` that answers `--version` like `solc`
    #[cfg(unix)]
    fn fake_solc(path: &Path, version: &str) {
        use std::os::unix::fs::PermissionsExt;

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!("#!/bin/sh\necho 'Version: {version}+commit.c7dfd78e.Linux.g++'\n"),
        )
        .unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_find_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let res = Solc::find("0.8.0", Some(&dir.path().join("no-such-solc")), true).await;
        assert!(matches!(res, Err(ScriptError::CompilerNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_home_without_install_fails() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(installed_compiler(Some(home.path()), "0.8.0"), None);

        let res = Solc::locate("0.8.0", None, &home.path().join(SOLC_COMMAND), false).await;
        assert!(matches!(res, Err(ScriptError::CompilerNotFound(_))));
    }

    #[tokio::test]
    #[ignore = "downloads solc 0.8.0"]
    async fn test_empty_home_installs_compiler() {
        let home = tempfile::tempdir().unwrap();
        let installed = installed_compiler(Some(home.path()), "0.8.0");

        let solc = Solc::locate("0.8.0", installed, &home.path().join(SOLC_COMMAND), true)
            .await
            .unwrap();
        assert_eq!(solc.version(), "0.8.0");
        assert!(solc.path().is_file());
    }

    #[tokio::test]
    async fn test_install_rejects_malformed_version() {
        let res = install_compiler("0.8").await;
        assert!(matches!(res, Err(ScriptError::CompilerInstallation(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_svm_install_is_found() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".svm/0.8.0/solc-0.8.0");
        fake_solc(&path, "0.8.0");

        let installed = installed_compiler(Some(home.path()), "0.8.0");
        assert_eq!(installed.as_deref(), Some(path.as_path()));

        let solc = Solc::locate("0.8.0", installed, &home.path().join(SOLC_COMMAND), false)
            .await
            .unwrap();
        assert_eq!(solc.path(), path);
        assert_eq!(solc.version(), "0.8.0");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fallback_with_wrong_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SOLC_COMMAND);
        fake_solc(&path, "0.8.1");

        let res = Solc::locate("0.8.0", None, &path, false).await;
        assert!(matches!(res, Err(ScriptError::CompilerVersion(_))));
    }
}
