// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Every setting has a default, so an absent file is equivalent to `{}`.
//! Any invalid field results in a HardValidationError before a container
//! is touched.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CheckpointError, HardValidationError, StasisResult};

/// Highest verbosity level understood by CRIU (`-v4`).
const MAX_CRIU_LOG_LEVEL: u8 = 4;

/// Raw CRIU section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawCriuConfig {
    #[serde(default)]
    path: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: u8,
    #[serde(default = "default_log_file")]
    log_file: String,
}

fn default_log_level() -> u8 {
    4
}

fn default_log_file() -> String {
    "dump.log".to_string()
}

impl Default for RawCriuConfig {
    fn default() -> Self {
        Self {
            path: None,
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

/// Raw inspector section.
#[derive(Debug, Deserialize)]
struct RawInspectorConfig {
    #[serde(default = "default_inspector_binary")]
    binary: String,
    #[serde(default = "default_runtime")]
    default_runtime: String,
    #[serde(default = "default_cgroup_prefix")]
    cgroup_prefix: String,
    #[serde(default = "default_bundle_root")]
    bundle_root: String,
}

fn default_inspector_binary() -> String {
    "docker".to_string()
}

fn default_runtime() -> String {
    "runc".to_string()
}

fn default_cgroup_prefix() -> String {
    "docker".to_string()
}

fn default_bundle_root() -> String {
    "/run/docker".to_string()
}

impl Default for RawInspectorConfig {
    fn default() -> Self {
        Self {
            binary: default_inspector_binary(),
            default_runtime: default_runtime(),
            cgroup_prefix: default_cgroup_prefix(),
            bundle_root: default_bundle_root(),
        }
    }
}

/// Raw storage section.
#[derive(Debug, Deserialize)]
struct RawStorageConfig {
    #[serde(default = "default_base_dir")]
    base_dir: String,
}

fn default_base_dir() -> String {
    "/tmp/docker-checkpoints".to_string()
}

impl Default for RawStorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    criu: RawCriuConfig,
    #[serde(default)]
    inspector: RawInspectorConfig,
    #[serde(default)]
    storage: RawStorageConfig,
}

/// Settings handed to the CRIU client and the request builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriuSettings {
    /// Explicit CRIU binary; `None` means discover it at startup.
    pub path: Option<PathBuf>,
    /// Verbosity passed as `-v<level>`.
    pub log_level: u8,
    /// Log file name, created inside the image directory.
    pub log_file: String,
}

impl Default for CriuSettings {
    fn default() -> Self {
        Self {
            path: None,
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

/// Settings for the runtime inspection collaborator and the fallbacks
/// applied when it omits a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorSettings {
    pub binary: PathBuf,
    /// Runtime kind recorded when the service does not report one.
    pub default_runtime: String,
    /// Namespace prefix for synthesized cgroup paths (`/<prefix>/<id>`).
    pub cgroup_prefix: String,
    /// Root under which runtime bundles live.
    pub bundle_root: PathBuf,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(default_inspector_binary()),
            default_runtime: default_runtime(),
            cgroup_prefix: default_cgroup_prefix(),
            bundle_root: PathBuf::from(default_bundle_root()),
        }
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub criu: CriuSettings,
    pub inspector: InspectorSettings,
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            criu: CriuSettings::default(),
            inspector: InspectorSettings::default(),
            base_dir: PathBuf::from(default_base_dir()),
        }
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> StasisResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CheckpointError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CheckpointError::ConfigParse {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> StasisResult<Config> {
        // An empty document deserializes to unit, not to an empty mapping.
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| CheckpointError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> StasisResult<Config> {
        let criu = Self::validate_criu(raw.criu)?;
        let inspector = Self::validate_inspector(raw.inspector)?;

        if raw.storage.base_dir.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "base_dir",
                context: "storage section".to_string(),
            }
            .into());
        }

        Ok(Config {
            criu,
            inspector,
            base_dir: PathBuf::from(raw.storage.base_dir),
        })
    }

    fn validate_criu(raw: RawCriuConfig) -> StasisResult<CriuSettings> {
        if raw.log_level > MAX_CRIU_LOG_LEVEL {
            return Err(HardValidationError::InvalidFieldValue {
                field: "log_level",
                value: raw.log_level.to_string(),
                reason: format!("Must be between 0 and {}", MAX_CRIU_LOG_LEVEL),
            }
            .into());
        }

        // The log file lives inside the image directory and is read back on failure.
        if raw.log_file.is_empty() || raw.log_file.contains('/') || raw.log_file == ".." {
            return Err(HardValidationError::InvalidFieldValue {
                field: "log_file",
                value: raw.log_file,
                reason: "Must be a bare file name".to_string(),
            }
            .into());
        }

        let path = match raw.path {
            Some(p) if p.is_empty() => {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "criu.path",
                    value: p,
                    reason: "Omit the field to discover CRIU automatically".to_string(),
                }
                .into());
            }
            Some(p) => Some(PathBuf::from(p)),
            None => None,
        };

        Ok(CriuSettings {
            path,
            log_level: raw.log_level,
            log_file: raw.log_file,
        })
    }

    fn validate_inspector(raw: RawInspectorConfig) -> StasisResult<InspectorSettings> {
        if raw.binary.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "binary",
                context: "inspector section".to_string(),
            }
            .into());
        }

        if raw.default_runtime.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "default_runtime",
                context: "inspector section".to_string(),
            }
            .into());
        }

        if raw.cgroup_prefix.is_empty() || raw.cgroup_prefix.contains('/') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "cgroup_prefix",
                value: raw.cgroup_prefix,
                reason: "Must be a single non-empty path component".to_string(),
            }
            .into());
        }

        if !raw.bundle_root.starts_with('/') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "bundle_root",
                value: raw.bundle_root,
                reason: "Must be an absolute path".to_string(),
            }
            .into());
        }

        Ok(InspectorSettings {
            binary: PathBuf::from(raw.binary),
            default_runtime: raw.default_runtime,
            cgroup_prefix: raw.cgroup_prefix,
            bundle_root: PathBuf::from(raw.bundle_root),
        })
    }
}
