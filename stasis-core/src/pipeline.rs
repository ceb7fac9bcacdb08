// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end checkpoint pipeline.
//!
//! Collector → Classifier → Builder → Executor → Record Writer, strictly in
//! order, one attempt, no retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::classifier::{classify, Classification};
use crate::collector::{Collector, RuntimeDescriptor};
use crate::config::Config;
use crate::criu::{CheckpointOptions, CheckpointPrimitive, ImageDir, RequestBuilder};
use crate::error::StasisResult;
use crate::executor::{observe_target, CaptureReport, CheckpointExecutor, TargetState};
use crate::inspect::ContainerInspector;
use crate::record::{CheckpointRecord, RecordWriter};
use crate::types::CheckpointName;

/// Result of a successful checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointOutcome {
    pub descriptor: RuntimeDescriptor,
    /// Directory holding the images, the CRIU log and the record.
    pub directory: PathBuf,
    pub record_path: PathBuf,
    pub report: CaptureReport,
    /// Target liveness observed after the dump.
    pub target: TargetState,
}

impl CheckpointOutcome {
    /// Whether the observed target state agrees with `leave_running`.
    pub fn target_matches(&self, options: &CheckpointOptions) -> bool {
        matches_intent(self.target, options)
    }
}

fn matches_intent(target: TargetState, options: &CheckpointOptions) -> bool {
    match target {
        TargetState::Running => options.leave_running,
        TargetState::Exited => !options.leave_running,
        TargetState::Unknown => true,
    }
}

/// Orchestrates one checkpoint attempt per call to [`Checkpointer::run`].
pub struct Checkpointer<I, P> {
    collector: Collector<I>,
    builder: RequestBuilder,
    executor: CheckpointExecutor<P>,
    cgroup_prefix: String,
}

impl<I: ContainerInspector, P: CheckpointPrimitive> Checkpointer<I, P> {
    /// Create a pipeline from its two collaborators and validated config.
    pub fn new(inspector: I, primitive: P, config: &Config) -> Self {
        Self {
            collector: Collector::new(inspector, config.inspector.clone()),
            builder: RequestBuilder::new(&config.criu),
            executor: CheckpointExecutor::new(primitive),
            cgroup_prefix: config.inspector.cgroup_prefix.clone(),
        }
    }

    /// Collect and classify without capturing anything.
    pub fn describe(&self, reference: &str) -> StasisResult<(RuntimeDescriptor, Classification)> {
        let descriptor = self.collector.collect(reference)?;
        let classification = classify(&descriptor, &self.cgroup_prefix);
        Ok((descriptor, classification))
    }

    /// Checkpoint `reference` into `<base_dir>/<container name>/<name>`.
    ///
    /// # Errors
    /// Any stage failure, wrapped in the variant naming that stage. A
    /// `Persistence` error leaves valid images behind.
    pub fn run(
        &self,
        reference: &str,
        name: &CheckpointName,
        base_dir: &Path,
        options: &CheckpointOptions,
    ) -> StasisResult<CheckpointOutcome> {
        let (descriptor, classification) = self.describe(reference)?;

        let images_dir = Arc::new(ImageDir::create(base_dir, &descriptor.name, name)?);
        let directory = images_dir.path().to_path_buf();

        tracing::info!(
            container = %descriptor.name,
            checkpoint = %name,
            directory = %directory.display(),
            pre_dump = options.enable_pre_dump,
            "Checkpointing container"
        );

        let request = self
            .builder
            .build(&descriptor, &classification, options, images_dir);

        let report = self.executor.execute(&request)?;

        let target = observe_target(descriptor.process_id);
        if !matches_intent(target, options) {
            tracing::warn!(
                pid = %descriptor.process_id,
                observed = ?target,
                leave_running = options.leave_running,
                "Target process state does not match the requested outcome"
            );
        }

        let record = CheckpointRecord::new(&descriptor, options, report.completed_at);
        let record_path = RecordWriter::write(&record, &directory).map_err(|e| {
            tracing::error!(
                directory = %directory.display(),
                error = %e,
                "Record not written; checkpoint images remain usable"
            );
            e
        })?;

        tracing::info!(
            container = %descriptor.name,
            checkpoint = %name,
            elapsed_ms = report.elapsed.as_millis(),
            "Checkpoint successful"
        );

        Ok(CheckpointOutcome {
            descriptor,
            directory,
            record_path,
            report,
            target,
        })
    }
}
