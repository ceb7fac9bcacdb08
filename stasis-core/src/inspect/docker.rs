// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Docker-compatible inspection via the runtime CLI.
//!
//! Runs `<binary> inspect --type container <ref>` and decodes the JSON array
//! it prints. Works with any CLI that emits Docker's inspect schema.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;

use super::{ContainerInspector, InspectedContainer};
use crate::error::InspectError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawInspect {
    id: String,
    #[serde(default)]
    name: String,
    state: RawState,
    #[serde(default)]
    host_config: RawHostConfig,
    #[serde(default)]
    graph_driver: RawGraphDriver,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    #[serde(default)]
    status: String,
    #[serde(default)]
    running: bool,
    #[serde(default)]
    paused: bool,
    #[serde(default)]
    restarting: bool,
    #[serde(default)]
    pid: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawHostConfig {
    #[serde(default)]
    runtime: Option<String>,
    #[serde(default)]
    cgroup_parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawGraphDriver {
    #[serde(default)]
    data: Option<HashMap<String, String>>,
}

/// Inspector backed by the `docker` (or compatible) command line.
#[derive(Debug, Clone)]
pub struct DockerInspector {
    binary: PathBuf,
}

impl DockerInspector {
    /// Create an inspector that shells out to `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Decode the JSON printed by `docker inspect`.
    pub fn parse_output(reference: &str, stdout: &[u8]) -> Result<InspectedContainer, InspectError> {
        let entries: Vec<RawInspect> =
            serde_json::from_slice(stdout).map_err(|e| InspectError::Malformed {
                reason: format!("Invalid inspect JSON: {}", e),
            })?;

        let raw = entries
            .into_iter()
            .next()
            .ok_or_else(|| InspectError::NotFound {
                reference: reference.to_string(),
            })?;

        let filesystem_root = raw
            .graph_driver
            .data
            .and_then(|mut data| data.remove("MergedDir"))
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(InspectedContainer {
            id: raw.id,
            name: raw.name.trim_start_matches('/').to_string(),
            pid: raw.state.pid,
            status: raw.state.status,
            running: raw.state.running,
            paused: raw.state.paused,
            restarting: raw.state.restarting,
            filesystem_root,
            runtime: raw.host_config.runtime.filter(|r| !r.is_empty()),
            cgroup_parent: raw.host_config.cgroup_parent.filter(|c| !c.is_empty()),
        })
    }
}

impl Default for DockerInspector {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerInspector for DockerInspector {
    fn inspect(&self, reference: &str) -> Result<InspectedContainer, InspectError> {
        tracing::debug!(
            binary = %self.binary.display(),
            reference = %reference,
            "Inspecting container"
        );

        let output = Command::new(&self.binary)
            .arg("inspect")
            .arg("--type")
            .arg("container")
            .arg(reference)
            .output()
            .map_err(|e| InspectError::Unavailable {
                reason: format!("Failed to execute {}: {}", self.binary.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such") {
                return Err(InspectError::NotFound {
                    reference: reference.to_string(),
                });
            }
            return Err(InspectError::Unavailable {
                reason: format!("{} inspect failed: {}", self.binary.display(), stderr.trim()),
            });
        }

        Self::parse_output(reference, &output.stdout)
    }
}
