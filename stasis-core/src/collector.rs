// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Runtime fact collection.
//!
//! Turns one inspection query into an immutable [`RuntimeDescriptor`].
//! A descriptor only exists for a container observed in the running state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::InspectorSettings;
use crate::error::{CheckpointError, InspectError, StasisResult};
use crate::inspect::ContainerInspector;
use crate::types::{ContainerId, ProcessId};

/// Kernel namespace kinds tracked for every container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Ipc,
    Mnt,
    Net,
    Pid,
    User,
    Uts,
    Cgroup,
}

impl NamespaceKind {
    /// Every recognized kind, in `/proc/<pid>/ns` naming order.
    pub const ALL: [NamespaceKind; 7] = [
        Self::Ipc,
        Self::Mnt,
        Self::Net,
        Self::Pid,
        Self::User,
        Self::Uts,
        Self::Cgroup,
    ];

    /// Entry name under `/proc/<pid>/ns`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ipc => "ipc",
            Self::Mnt => "mnt",
            Self::Net => "net",
            Self::Pid => "pid",
            Self::User => "user",
            Self::Uts => "uts",
            Self::Cgroup => "cgroup",
        }
    }

    /// Handle path of this namespace for `pid`. Existence is not checked.
    pub fn handle_path(&self, pid: ProcessId) -> PathBuf {
        PathBuf::from(format!("/proc/{}/ns/{}", pid, self.as_str()))
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of one running container at inspection time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeDescriptor {
    /// Abbreviated runtime identifier.
    pub id: ContainerId,
    pub name: String,
    pub process_id: ProcessId,
    pub state: String,
    /// Absolute path of the materialized root filesystem.
    pub filesystem_root: PathBuf,
    pub runtime_kind: String,
    /// Informational only; not needed for capture.
    pub bundle_path: PathBuf,
    /// Cgroup parent as reported; empty when the runtime chose the default.
    pub cgroup_path: String,
    pub namespace_handles: BTreeMap<NamespaceKind, PathBuf>,
}

/// Queries the inspection service and normalises its answer.
pub struct Collector<I> {
    inspector: I,
    settings: InspectorSettings,
}

impl<I: ContainerInspector> Collector<I> {
    /// Create a collector over `inspector`, applying the fallbacks in `settings`.
    pub fn new(inspector: I, settings: InspectorSettings) -> Self {
        Self {
            inspector,
            settings,
        }
    }

    /// Collect the runtime facts for `reference`.
    ///
    /// # Errors
    /// `NotFound` when the reference does not resolve, `InvalidState` when the
    /// container is not running, `Inspection` for any other service failure.
    pub fn collect(&self, reference: &str) -> StasisResult<RuntimeDescriptor> {
        let info = self.inspector.inspect(reference).map_err(|e| match e {
            InspectError::NotFound { reference } => CheckpointError::NotFound { reference },
            other => CheckpointError::Inspection(other),
        })?;

        // Paused and restarting containers still report `running`.
        if !info.running || info.paused || info.restarting || info.status != "running" {
            return Err(CheckpointError::InvalidState {
                reference: reference.to_string(),
                state: info.status,
            });
        }

        let full_id = ContainerId::new(info.id).map_err(|e| {
            CheckpointError::Inspection(InspectError::Malformed {
                reason: e.to_string(),
            })
        })?;

        let process_id = ProcessId::new(info.pid).map_err(|_| {
            CheckpointError::Inspection(InspectError::Malformed {
                reason: format!("Running container {} reported PID 0", reference),
            })
        })?;

        let runtime_kind = info
            .runtime
            .unwrap_or_else(|| self.settings.default_runtime.clone());

        // Storage drivers without a merged dir still expose the root through procfs.
        let filesystem_root = info
            .filesystem_root
            .unwrap_or_else(|| PathBuf::from(format!("/proc/{}/root", process_id)));

        let bundle_path = self
            .settings
            .bundle_root
            .join(format!("runtime-{}", runtime_kind))
            .join("moby")
            .join(full_id.as_str());

        let namespace_handles = NamespaceKind::ALL
            .iter()
            .map(|kind| (*kind, kind.handle_path(process_id)))
            .collect();

        // Short form of a valid hex id is itself valid.
        let id = ContainerId::new(full_id.short()).map_err(|e| {
            CheckpointError::Inspection(InspectError::Malformed {
                reason: e.to_string(),
            })
        })?;

        let descriptor = RuntimeDescriptor {
            id,
            name: info.name,
            process_id,
            state: info.status,
            filesystem_root,
            runtime_kind,
            bundle_path,
            cgroup_path: info.cgroup_parent.unwrap_or_default(),
            namespace_handles,
        };

        tracing::info!(
            container_id = %descriptor.id,
            name = %descriptor.name,
            pid = %descriptor.process_id,
            runtime = %descriptor.runtime_kind,
            "Collected runtime facts"
        );

        Ok(descriptor)
    }
}
