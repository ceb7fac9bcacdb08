// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Container-runtime inspection collaborator.
//!
//! The engine only ever issues a single read-only query per attempt.

mod docker;

use std::path::PathBuf;

pub use docker::DockerInspector;

use crate::error::InspectError;

/// Raw facts reported by the inspection service for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectedContainer {
    /// Full runtime identifier.
    pub id: String,
    /// Container name without the leading `/`.
    pub name: String,
    /// Host PID of the container's init process (0 when not running).
    pub pid: u32,
    /// Runtime status string, e.g. `running` or `exited`.
    pub status: String,
    pub running: bool,
    /// Docker keeps `running` set while a container is frozen.
    pub paused: bool,
    /// Docker keeps `running` set while a container is being restarted.
    pub restarting: bool,
    /// Merged root filesystem, when the storage driver exposes one.
    pub filesystem_root: Option<PathBuf>,
    /// OCI runtime name; empty values are normalised to `None`.
    pub runtime: Option<String>,
    pub cgroup_parent: Option<String>,
}

/// Query interface of the container-runtime inspection service.
pub trait ContainerInspector {
    /// Resolve `reference` (name or id) to the container's current facts.
    fn inspect(&self, reference: &str) -> Result<InspectedContainer, InspectError>;
}

impl<T: ContainerInspector + ?Sized> ContainerInspector for &T {
    fn inspect(&self, reference: &str) -> Result<InspectedContainer, InspectError> {
        (**self).inspect(reference)
    }
}
