// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CRIU invocation.
//!
//! Runs the `criu` binary for pre-dump and dump passes. Both passes write
//! their images and log into the request's image directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use super::request::CriuOptions;
use crate::error::CriuError;

/// The checkpoint primitive: a black box that captures a process tree.
pub trait CheckpointPrimitive {
    /// Incremental pass with memory tracking enabled.
    fn pre_dump(&self, options: &CriuOptions) -> Result<(), CriuError>;

    /// Full capture pass.
    fn dump(&self, options: &CriuOptions) -> Result<(), CriuError>;
}

impl<T: CheckpointPrimitive + ?Sized> CheckpointPrimitive for &T {
    fn pre_dump(&self, options: &CriuOptions) -> Result<(), CriuError> {
        (**self).pre_dump(options)
    }

    fn dump(&self, options: &CriuOptions) -> Result<(), CriuError> {
        (**self).dump(options)
    }
}

/// Client bound to one CRIU binary.
#[derive(Debug, Clone)]
pub struct CriuClient {
    criu_path: PathBuf,
}

impl CriuClient {
    /// Create a client for the CRIU binary at `criu_path`.
    pub fn new(criu_path: impl Into<PathBuf>) -> Self {
        Self {
            criu_path: criu_path.into(),
        }
    }

    /// Create a client for the first CRIU binary found on this host.
    pub fn discover() -> Result<Self, CriuError> {
        let criu_path = Self::find_criu()?;
        tracing::info!(criu_path = %criu_path.display(), "Found CRIU binary");
        Ok(Self { criu_path })
    }

    /// Find the CRIU binary.
    fn find_criu() -> Result<PathBuf, CriuError> {
        let candidates = [
            "/usr/sbin/criu",
            "/usr/bin/criu",
            "/sbin/criu",
            "/bin/criu",
            "/usr/local/sbin/criu",
            "/usr/local/bin/criu",
        ];

        for path in candidates {
            let p = PathBuf::from(path);
            if p.exists() {
                return Ok(p);
            }
        }

        // Try which
        if let Ok(output) = Command::new("which").arg("criu").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(CriuError::BinaryNotFound)
    }

    /// Path of the CRIU binary.
    pub fn criu_path(&self) -> &Path {
        &self.criu_path
    }

    fn run(&self, action: &'static str, options: &CriuOptions) -> Result<(), CriuError> {
        let args = options.to_args();

        tracing::debug!(
            action = action,
            pid = %options.pid,
            images_dir = %options.images_dir.path().display(),
            args = ?args,
            "Invoking CRIU"
        );

        let start = Instant::now();

        let output = Command::new(&self.criu_path)
            .arg(action)
            .args(&args)
            .output()
            .map_err(|e| CriuError::Spawn {
                path: self.criu_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(CriuError::Exited {
                action,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::info!(
            action = action,
            pid = %options.pid,
            elapsed_ms = start.elapsed().as_millis(),
            "CRIU pass completed"
        );

        Ok(())
    }
}

impl CheckpointPrimitive for CriuClient {
    fn pre_dump(&self, options: &CriuOptions) -> Result<(), CriuError> {
        self.run("pre-dump", options)
    }

    fn dump(&self, options: &CriuOptions) -> Result<(), CriuError> {
        self.run("dump", options)
    }
}
