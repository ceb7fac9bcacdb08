// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Checkpoint record persistence.
//!
//! Writes `container.json` next to the CRIU images. The record carries what a
//! later restore needs to interpret the images and is never mutated once
//! written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::{NamespaceKind, RuntimeDescriptor};
use crate::criu::CheckpointOptions;
use crate::error::{CheckpointError, StasisResult};
use crate::types::ContainerId;

/// File name of the record inside the checkpoint directory.
pub const RECORD_FILE: &str = "container.json";

/// Durable description of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub id: ContainerId,
    pub name: String,
    pub runtime: String,
    pub rootfs: PathBuf,
    pub bundle_path: PathBuf,
    pub namespaces: BTreeMap<NamespaceKind, PathBuf>,
    pub cgroup_path: String,
    pub checkpointed_at: DateTime<Utc>,
    pub options: CheckpointOptions,
}

impl CheckpointRecord {
    /// Derive the record of a capture of `descriptor` completed at `checkpointed_at`.
    pub fn new(
        descriptor: &RuntimeDescriptor,
        options: &CheckpointOptions,
        checkpointed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            runtime: descriptor.runtime_kind.clone(),
            rootfs: descriptor.filesystem_root.clone(),
            bundle_path: descriptor.bundle_path.clone(),
            namespaces: descriptor.namespace_handles.clone(),
            cgroup_path: descriptor.cgroup_path.clone(),
            checkpointed_at,
            options: *options,
        }
    }
}

/// Writes checkpoint records.
pub struct RecordWriter;

impl RecordWriter {
    /// Write `record` into `directory`, replacing any previous record.
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// readers never see a partial record.
    pub fn write(record: &CheckpointRecord, directory: &Path) -> StasisResult<PathBuf> {
        let path = directory.join(RECORD_FILE);
        let staging = directory.join(format!(".{}.tmp", RECORD_FILE));

        let mut contents = serde_json::to_vec_pretty(record).map_err(|e| {
            CheckpointError::Persistence {
                path: path.clone(),
                source: e.into(),
            }
        })?;
        contents.push(b'\n');

        std::fs::write(&staging, &contents)
            .and_then(|()| std::fs::rename(&staging, &path))
            .map_err(|e| {
                let _ = std::fs::remove_file(&staging);
                CheckpointError::Persistence {
                    path: path.clone(),
                    source: e,
                }
            })?;

        tracing::info!(path = %path.display(), "Checkpoint record written");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    use crate::types::ProcessId;

    fn descriptor() -> RuntimeDescriptor {
        let pid = ProcessId::new(4321).unwrap();
        RuntimeDescriptor {
            id: ContainerId::new("9f1c2b3a4d5e").unwrap(),
            name: "web1".to_string(),
            process_id: pid,
            state: "running".to_string(),
            filesystem_root: PathBuf::from("/var/lib/docker/overlay2/abc/merged"),
            runtime_kind: "runc".to_string(),
            bundle_path: PathBuf::from("/run/docker/runtime-runc/moby/9f1c2b3a4d5e"),
            cgroup_path: String::new(),
            namespace_handles: NamespaceKind::ALL
                .iter()
                .map(|kind| (*kind, kind.handle_path(pid)))
                .collect(),
        }
    }

    fn record() -> CheckpointRecord {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        CheckpointRecord::new(&descriptor(), &CheckpointOptions::default(), at)
    }

    #[test]
    fn test_record_fields() {
        let temp = TempDir::new().unwrap();
        let path = RecordWriter::write(&record(), temp.path()).unwrap();
        assert_eq!(path, temp.path().join("container.json"));

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["id"], "9f1c2b3a4d5e");
        assert_eq!(value["name"], "web1");
        assert_eq!(value["runtime"], "runc");
        assert_eq!(value["rootfs"], "/var/lib/docker/overlay2/abc/merged");
        assert_eq!(value["cgroup_path"], "");
        assert_eq!(value["namespaces"]["net"], "/proc/4321/ns/net");
        assert_eq!(value["checkpointed_at"], "2025-03-14T09:26:53Z");
        assert_eq!(value["options"]["leave_running"], true);
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let record = record();

        let path = RecordWriter::write(&record, temp.path()).unwrap();
        let first = std::fs::read(&path).unwrap();
        RecordWriter::write(&record, temp.path()).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(!temp.path().join(".container.json.tmp").exists());
    }

    #[test]
    fn test_record_reads_back() {
        let temp = TempDir::new().unwrap();
        let record = record();
        let path = RecordWriter::write(&record, temp.path()).unwrap();

        let parsed: CheckpointRecord =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_missing_directory_is_persistence_error() {
        let temp = TempDir::new().unwrap();
        let result = RecordWriter::write(&record(), &temp.path().join("gone"));
        assert!(matches!(result, Err(CheckpointError::Persistence { .. })));
    }
}
