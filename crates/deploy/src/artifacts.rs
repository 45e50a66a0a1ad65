//! Reader for hardhat compilation artifacts.
//!
//! Layout: `<root>/<source path>/<Name>.json` holds the creation bytecode,
//! `<Name>.dbg.json` points at the build-info file holding the compiler
//! version and the standard-JSON input used for source verification.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigurationError;

/// Default artifacts directory of a hardhat project.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub bytecode: Bytes,
    #[serde(skip)]
    path: PathBuf,
}

impl ContractArtifact {
    /// Fully qualified name, e.g. `contracts/Raffle.sol:Raffle`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// Compiler input and version of a build.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    pub input: Value,
}

impl BuildInfo {
    /// Compiler version in the `v0.8.7+commit.e28d00a7` form explorers expect.
    pub fn compiler_version(&self) -> String {
        format!("v{}", self.solc_long_version)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Handle on an artifacts directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    root: PathBuf,
}

impl Artifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find and parse the artifact of `name`.
    pub fn find(&self, name: &str) -> Result<ContractArtifact, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Artifact {
            name: name.to_string(),
            reason,
        };

        let path = Self::search(&self.root, &format!("{name}.json"))
            .map_err(|e| invalid(format!("failed to scan {}: {e}", self.root.display())))?
            .ok_or_else(|| invalid(format!("not found under {}", self.root.display())))?;

        let content = std::fs::read_to_string(&path)
            .map_err(|e| invalid(format!("failed to read {}: {e}", path.display())))?;
        let mut artifact: ContractArtifact = serde_json::from_str(&content)
            .map_err(|e| invalid(format!("failed to parse {}: {e}", path.display())))?;

        if artifact.bytecode.is_empty() {
            return Err(invalid("bytecode is empty (abstract contract or interface?)".into()));
        }

        artifact.path = path;
        tracing::trace!(name, path = %artifact.path.display(), "Artifact loaded");
        Ok(artifact)
    }

    /// Load the build-info referenced by an artifact's debug file.
    pub fn build_info(&self, artifact: &ContractArtifact) -> Result<BuildInfo, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::Artifact {
            name: artifact.contract_name.clone(),
            reason,
        };

        let dbg_path = artifact
            .path
            .with_file_name(format!("{}.dbg.json", artifact.contract_name));
        let dbg: DebugFile = read_json(&dbg_path).map_err(invalid)?;

        let dir = dbg_path.parent().unwrap_or(&self.root);
        read_json(&dir.join(dbg.build_info)).map_err(invalid)
    }

    /// Depth-first search for `file_name` inside `*.sol` directories.
    fn search(dir: &Path, file_name: &str) -> std::io::Result<Option<PathBuf>> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            if !path.is_dir() || path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }

            let is_source_dir = path.extension().is_some_and(|ext| ext == "sol");
            let candidate = path.join(file_name);
            if is_source_dir && candidate.is_file() {
                return Ok(Some(candidate));
            }

            if let Some(found) = Self::search(&path, file_name)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn write_project(root: &Path) {
        let raffle_dir = root.join("contracts/Raffle.sol");
        std::fs::create_dir_all(&raffle_dir).unwrap();
        std::fs::write(
            raffle_dir.join("Raffle.json"),
            r#"{"contractName":"Raffle","sourceName":"contracts/Raffle.sol","abi":[],"bytecode":"0x6080604052"}"#,
        )
        .unwrap();
        std::fs::write(
            raffle_dir.join("Raffle.dbg.json"),
            r#"{"_format":"hh-sol-dbg-1","buildInfo":"../../build-info/abc.json"}"#,
        )
        .unwrap();

        let build_info = root.join("build-info");
        std::fs::create_dir_all(&build_info).unwrap();
        std::fs::write(
            build_info.join("abc.json"),
            r#"{"solcVersion":"0.8.7","solcLongVersion":"0.8.7+commit.e28d00a7","input":{"language":"Solidity"}}"#,
        )
        .unwrap();

        let mock_dir = root.join("@chainlink/contracts/src/v0.8/mocks/VRFCoordinatorV2Mock.sol");
        std::fs::create_dir_all(&mock_dir).unwrap();
        std::fs::write(
            mock_dir.join("VRFCoordinatorV2Mock.json"),
            r#"{"contractName":"VRFCoordinatorV2Mock","sourceName":"@chainlink/contracts/src/v0.8/mocks/VRFCoordinatorV2Mock.sol","bytecode":"0x60a0"}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_find_nested_artifacts() {
        let temp_dir = TempDir::new("rafflekit-artifacts").expect("Failed to create temp dir");
        write_project(temp_dir.path());
        let artifacts = Artifacts::new(temp_dir.path());

        let raffle = artifacts.find("Raffle").unwrap();
        assert_eq!(raffle.fully_qualified_name(), "contracts/Raffle.sol:Raffle");
        assert_eq!(raffle.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);

        let mock = artifacts.find("VRFCoordinatorV2Mock").unwrap();
        assert_eq!(mock.contract_name, "VRFCoordinatorV2Mock");
    }

    #[test]
    fn test_build_info_resolves_compiler_version() {
        let temp_dir = TempDir::new("rafflekit-artifacts").expect("Failed to create temp dir");
        write_project(temp_dir.path());
        let artifacts = Artifacts::new(temp_dir.path());

        let raffle = artifacts.find("Raffle").unwrap();
        let build_info = artifacts.build_info(&raffle).unwrap();
        assert_eq!(build_info.compiler_version(), "v0.8.7+commit.e28d00a7");
        assert_eq!(build_info.input["language"], "Solidity");
    }

    #[test]
    fn test_missing_artifact() {
        let temp_dir = TempDir::new("rafflekit-artifacts").expect("Failed to create temp dir");
        let err = Artifacts::new(temp_dir.path()).find("Raffle").unwrap_err();
        assert!(matches!(err, ConfigurationError::Artifact { .. }));
    }
}
