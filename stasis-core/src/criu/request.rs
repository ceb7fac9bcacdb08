// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CRIU request construction.
//!
//! Pure translation from runtime facts, classification and caller intent
//! into the exact option set handed to CRIU.

use std::ffi::OsString;
use std::fs::{DirBuilder, File};
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::{CgroupRoot, Classification, ExternalMount};
use crate::collector::RuntimeDescriptor;
use crate::config::CriuSettings;
use crate::error::{CheckpointError, StasisResult};
use crate::types::{CheckpointName, ProcessId};

/// Caller intent for one checkpoint, independent of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointOptions {
    /// Keep the container running once the dump completes.
    pub leave_running: bool,
    /// Capture established TCP connections.
    pub preserve_tcp: bool,
    /// Capture held file locks.
    pub preserve_file_locks: bool,
    /// Run a memory-tracking pre-dump before the full dump.
    pub enable_pre_dump: bool,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            leave_running: true,
            preserve_tcp: true,
            preserve_file_locks: true,
            enable_pre_dump: false,
        }
    }
}

/// Destination directory of one checkpoint attempt, held open while in use.
///
/// The leaf directory is always created by this attempt, so no prior or
/// concurrent attempt can share it.
#[derive(Debug)]
pub struct ImageDir {
    path: PathBuf,
    _handle: File,
}

impl ImageDir {
    /// Create `<base_dir>/<container_name>/<checkpoint_name>`.
    ///
    /// # Errors
    /// Returns `Configuration` if the directory already exists or cannot be
    /// created or opened.
    pub fn create(
        base_dir: &Path,
        container_name: &str,
        checkpoint_name: &CheckpointName,
    ) -> StasisResult<Self> {
        if container_name.is_empty()
            || container_name.contains('/')
            || container_name == "."
            || container_name == ".."
        {
            return Err(CheckpointError::Configuration {
                path: base_dir.to_path_buf(),
                reason: format!(
                    "Container name {:?} is not a valid path component",
                    container_name
                ),
            });
        }

        let parent = base_dir.join(container_name);
        let path = parent.join(checkpoint_name.as_str());

        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&parent)
            .map_err(|e| CheckpointError::Configuration {
                path: parent.clone(),
                reason: format!("Failed to create parent directory: {}", e),
            })?;

        DirBuilder::new()
            .mode(0o755)
            .create(&path)
            .map_err(|e| CheckpointError::Configuration {
                path: path.clone(),
                reason: if e.kind() == std::io::ErrorKind::AlreadyExists {
                    "Checkpoint already exists; choose a new checkpoint name".to_string()
                } else {
                    format!("Failed to create checkpoint directory: {}", e)
                },
            })?;

        let handle = File::open(&path).map_err(|e| CheckpointError::Configuration {
            path: path.clone(),
            reason: format!("Failed to open checkpoint directory: {}", e),
        })?;

        tracing::debug!(path = %path.display(), "Created checkpoint directory");

        Ok(Self {
            path,
            _handle: handle,
        })
    }

    /// Path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Option set of a single CRIU invocation.
#[derive(Debug, Clone)]
pub struct CriuOptions {
    pub pid: ProcessId,
    pub log_level: u8,
    /// Log file name, relative to the image directory.
    pub log_file: String,
    pub root: PathBuf,
    pub manage_cgroups: bool,
    pub tcp_established: bool,
    pub file_locks: bool,
    pub leave_running: bool,
    pub shell_job: bool,
    pub track_mem: bool,
    pub external: Vec<ExternalMount>,
    pub cgroup_roots: Vec<CgroupRoot>,
    pub images_dir: Arc<ImageDir>,
}

impl CriuOptions {
    /// Command-line arguments following the CRIU action.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-t".into(),
            self.pid.to_string().into(),
            "-D".into(),
            self.images_dir.path().into(),
            "-o".into(),
            self.log_file.clone().into(),
            format!("-v{}", self.log_level).into(),
            "--root".into(),
            self.root.clone().into(),
        ];

        if self.manage_cgroups {
            args.push("--manage-cgroups".into());
        }
        if self.tcp_established {
            args.push("--tcp-established".into());
        }
        if self.file_locks {
            args.push("--file-locks".into());
        }
        if self.leave_running {
            args.push("--leave-running".into());
        }
        if self.shell_job {
            args.push("--shell-job".into());
        }
        if self.track_mem {
            args.push("--track-mem".into());
        }

        for mount in &self.external {
            args.push("--external".into());
            args.push(mount.to_string().into());
        }

        for root in &self.cgroup_roots {
            args.push("--cgroup-root".into());
            args.push(root.to_string().into());
        }

        args
    }

    /// Path of this invocation's log file.
    pub fn log_path(&self) -> PathBuf {
        self.images_dir.path().join(&self.log_file)
    }

    /// Variant used for the pre-dump pass: memory tracking on, TCP off.
    fn pre_dump_variant(&self) -> Self {
        Self {
            track_mem: true,
            // Established connections cannot be preserved by an incomplete capture.
            tcp_established: false,
            ..self.clone()
        }
    }
}

/// Fully resolved checkpoint request.
#[derive(Debug, Clone)]
pub struct CheckpointRequest {
    /// Options of the full dump.
    pub dump: CriuOptions,
    /// Options of the pre-dump, present only when requested.
    pub pre_dump: Option<CriuOptions>,
}

/// Builds [`CheckpointRequest`]s with the configured log settings.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    log_level: u8,
    log_file: String,
}

impl RequestBuilder {
    /// Create a builder from validated CRIU settings.
    pub fn new(settings: &CriuSettings) -> Self {
        Self {
            log_level: settings.log_level,
            log_file: settings.log_file.clone(),
        }
    }

    /// Compose the request for `descriptor`.
    pub fn build(
        &self,
        descriptor: &RuntimeDescriptor,
        classification: &Classification,
        options: &CheckpointOptions,
        images_dir: Arc<ImageDir>,
    ) -> CheckpointRequest {
        let dump = CriuOptions {
            pid: descriptor.process_id,
            log_level: self.log_level,
            log_file: self.log_file.clone(),
            root: descriptor.filesystem_root.clone(),
            manage_cgroups: true,
            tcp_established: options.preserve_tcp,
            file_locks: options.preserve_file_locks,
            leave_running: options.leave_running,
            // Containers launched interactively need shell-job process group handling.
            shell_job: true,
            track_mem: false,
            external: classification.external_mounts.clone(),
            cgroup_roots: classification.cgroup_roots.clone(),
            images_dir,
        };

        let pre_dump = options.enable_pre_dump.then(|| dump.pre_dump_variant());

        CheckpointRequest { dump, pre_dump }
    }
}
