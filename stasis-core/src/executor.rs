// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Checkpoint execution.
//!
//! Sequences the optional pre-dump and the full dump against the checkpoint
//! primitive. A failed pre-dump ends the attempt; a failed dump surfaces the
//! CRIU log from the image directory when it can be read.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use crate::criu::{CheckpointPrimitive, CheckpointRequest};
use crate::error::{CheckpointError, StasisResult};
use crate::state::{CapturePhase, CaptureStateMachine};
use crate::types::ProcessId;

/// Summary of a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// Whether a pre-dump ran before the full dump.
    pub pre_dumped: bool,
    pub elapsed: Duration,
    pub completed_at: DateTime<Utc>,
    /// Phases the attempt went through.
    pub phases: Vec<CapturePhase>,
}

/// Liveness of the checkpointed process as observed after the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Running,
    Exited,
    Unknown,
}

/// Drives the checkpoint primitive through one capture attempt.
pub struct CheckpointExecutor<P> {
    primitive: P,
}

impl<P: CheckpointPrimitive> CheckpointExecutor<P> {
    /// Create an executor over `primitive`.
    pub fn new(primitive: P) -> Self {
        Self { primitive }
    }

    /// Execute `request`.
    ///
    /// # Errors
    /// `PreCaptureFailed` if the pre-dump fails (the dump is then never
    /// attempted), `CaptureFailed` if the dump fails.
    pub fn execute(&self, request: &CheckpointRequest) -> StasisResult<CaptureReport> {
        let mut machine = CaptureStateMachine::new();

        if let Some(pre_dump) = &request.pre_dump {
            machine.transition_to(CapturePhase::PreDumping)?;
            tracing::info!(pid = %pre_dump.pid, "Performing pre-dump");

            if let Err(e) = self.primitive.pre_dump(pre_dump) {
                machine.transition_to(CapturePhase::Failed)?;
                tracing::error!(pid = %pre_dump.pid, error = %e, "Pre-dump failed");
                return Err(CheckpointError::PreCaptureFailed(e));
            }
        }

        machine.transition_to(CapturePhase::Dumping)?;
        tracing::info!(pid = %request.dump.pid, "Performing checkpoint");

        if let Err(e) = self.primitive.dump(&request.dump) {
            machine.transition_to(CapturePhase::Failed)?;
            let log = read_log(&request.dump.log_path());
            tracing::error!(
                pid = %request.dump.pid,
                error = %e,
                log_available = log.is_some(),
                "Checkpoint dump failed"
            );
            return Err(CheckpointError::CaptureFailed { source: e, log });
        }

        machine.transition_to(CapturePhase::Done)?;

        Ok(CaptureReport {
            pre_dumped: request.pre_dump.is_some(),
            elapsed: machine.elapsed(),
            completed_at: Utc::now(),
            phases: machine.visited().to_vec(),
        })
    }
}

/// Read the CRIU log back; a missing or unreadable log is not an error.
fn read_log(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "CRIU log unavailable");
            None
        }
    }
}

/// Probe whether `pid` still exists using signal 0.
///
/// A zombie still answers the signal, so its `/proc/<pid>/stat` state is
/// checked before reporting it as running.
pub fn observe_target(pid: ProcessId) -> TargetState {
    let Ok(raw) = i32::try_from(pid.value()) else {
        return TargetState::Unknown;
    };

    match kill(Pid::from_raw(raw), None) {
        // EPERM: the process exists but belongs to someone else.
        Ok(()) | Err(Errno::EPERM) => match process_state(pid) {
            Some('Z') | Some('X') => TargetState::Exited,
            _ => TargetState::Running,
        },
        Err(Errno::ESRCH) => TargetState::Exited,
        Err(_) => TargetState::Unknown,
    }
}

fn process_state(pid: ProcessId) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    parse_stat_state(&stat)
}

/// State letter of a `/proc/<pid>/stat` line. The command name may itself
/// contain `)`, so the field after the last one is taken.
fn parse_stat_state(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::classifier::classify;
    use crate::collector::RuntimeDescriptor;
    use crate::config::CriuSettings;
    use crate::criu::{CheckpointOptions, CriuOptions, ImageDir, RequestBuilder};
    use crate::error::CriuError;
    use crate::types::{CheckpointName, ContainerId};

    #[derive(Default)]
    struct ScriptedPrimitive {
        fail_pre_dump: bool,
        fail_dump: bool,
        write_log: Option<&'static str>,
        calls: RefCell<Vec<&'static str>>,
    }

    fn failure(action: &'static str) -> CriuError {
        CriuError::Exited {
            action,
            status: "exit status: 1".to_string(),
            stderr: String::new(),
        }
    }

    impl CheckpointPrimitive for ScriptedPrimitive {
        fn pre_dump(&self, _options: &CriuOptions) -> Result<(), CriuError> {
            self.calls.borrow_mut().push("pre-dump");
            if self.fail_pre_dump {
                return Err(failure("pre-dump"));
            }
            Ok(())
        }

        fn dump(&self, options: &CriuOptions) -> Result<(), CriuError> {
            self.calls.borrow_mut().push("dump");
            if let Some(contents) = self.write_log {
                std::fs::write(options.log_path(), contents).unwrap();
            }
            if self.fail_dump {
                return Err(failure("dump"));
            }
            Ok(())
        }
    }

    fn request(temp: &TempDir, enable_pre_dump: bool) -> CheckpointRequest {
        let descriptor = RuntimeDescriptor {
            id: ContainerId::new("9f1c2b3a4d5e").unwrap(),
            name: "web1".to_string(),
            process_id: ProcessId::new(4321).unwrap(),
            state: "running".to_string(),
            filesystem_root: PathBuf::from("/merged"),
            runtime_kind: "runc".to_string(),
            bundle_path: PathBuf::from("/run/docker/runtime-runc/moby/9f1c2b3a4d5e"),
            cgroup_path: String::new(),
            namespace_handles: BTreeMap::new(),
        };
        let name = CheckpointName::new("checkpoint1").unwrap();
        let dir = ImageDir::create(temp.path(), "web1", &name).unwrap();
        let options = CheckpointOptions {
            enable_pre_dump,
            ..CheckpointOptions::default()
        };
        RequestBuilder::new(&CriuSettings::default()).build(
            &descriptor,
            &classify(&descriptor, "docker"),
            &options,
            Arc::new(dir),
        )
    }

    #[test]
    fn test_single_pass() {
        let temp = TempDir::new().unwrap();
        let primitive = ScriptedPrimitive::default();
        let report = CheckpointExecutor::new(&primitive)
            .execute(&request(&temp, false))
            .unwrap();

        assert!(!report.pre_dumped);
        assert_eq!(*primitive.calls.borrow(), vec!["dump"]);
        assert_eq!(
            report.phases,
            vec![CapturePhase::Idle, CapturePhase::Dumping, CapturePhase::Done]
        );
    }

    #[test]
    fn test_pre_dump_precedes_dump() {
        let temp = TempDir::new().unwrap();
        let primitive = ScriptedPrimitive::default();
        let report = CheckpointExecutor::new(&primitive)
            .execute(&request(&temp, true))
            .unwrap();

        assert!(report.pre_dumped);
        assert_eq!(*primitive.calls.borrow(), vec!["pre-dump", "dump"]);
    }

    #[test]
    fn test_failed_pre_dump_is_fatal() {
        let temp = TempDir::new().unwrap();
        let primitive = ScriptedPrimitive {
            fail_pre_dump: true,
            ..ScriptedPrimitive::default()
        };
        let result = CheckpointExecutor::new(&primitive).execute(&request(&temp, true));

        assert!(matches!(result, Err(CheckpointError::PreCaptureFailed(_))));
        assert_eq!(*primitive.calls.borrow(), vec!["pre-dump"]);
    }

    #[test]
    fn test_failed_dump_attaches_log() {
        let temp = TempDir::new().unwrap();
        let primitive = ScriptedPrimitive {
            fail_dump: true,
            write_log: Some("Error (criu/mount.c:1088): 8 not found"),
            ..ScriptedPrimitive::default()
        };
        let result = CheckpointExecutor::new(&primitive).execute(&request(&temp, false));

        match result {
            Err(CheckpointError::CaptureFailed { log, .. }) => {
                assert_eq!(log.as_deref(), Some("Error (criu/mount.c:1088): 8 not found"));
            }
            other => panic!("expected CaptureFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_dump_without_log() {
        let temp = TempDir::new().unwrap();
        let primitive = ScriptedPrimitive {
            fail_dump: true,
            ..ScriptedPrimitive::default()
        };
        let result = CheckpointExecutor::new(&primitive).execute(&request(&temp, false));

        assert!(matches!(
            result,
            Err(CheckpointError::CaptureFailed { log: None, .. })
        ));
    }

    #[test]
    fn test_observe_own_process_is_running() {
        let pid = ProcessId::new(std::process::id()).unwrap();
        assert_eq!(observe_target(pid), TargetState::Running);
    }

    #[test]
    fn test_parse_stat_state() {
        assert_eq!(parse_stat_state("4321 (bash) S 1 4321 4321 0 -1"), Some('S'));
        assert_eq!(parse_stat_state("4321 (we) ird) Z 1 4321 4321 0 -1"), Some('Z'));
        assert_eq!(parse_stat_state("garbage"), None);
    }

    #[test]
    fn test_unreaped_child_is_exited() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = ProcessId::new(child.id()).unwrap();

        // Wait for the child to exit without reaping it.
        let mut state = None;
        for _ in 0..200 {
            state = process_state(pid);
            if state == Some('Z') {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(state, Some('Z'));
        assert_eq!(observe_target(pid), TargetState::Exited);

        child.wait().unwrap();
    }
}
