// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Stasis Core Library
//!
//! Checkpoint configuration and orchestration engine for running containers.
//! Collects runtime facts, classifies runtime-managed resources, builds the
//! CRIU request, runs the (optionally two-phase) capture and persists a
//! record next to the images.

pub mod classifier;
pub mod collector;
pub mod config;
pub mod criu;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod pipeline;
pub mod record;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use classifier::{classify, Classification, CgroupRoot, ExternalMount};
pub use collector::{Collector, NamespaceKind, RuntimeDescriptor};
pub use config::{Config, ConfigLoader, CriuSettings, InspectorSettings};
pub use criu::{CheckpointOptions, CheckpointPrimitive, CheckpointRequest, CriuClient, CriuOptions};
pub use error::{CheckpointError, CriuError, HardValidationError, InspectError, StasisResult};
pub use executor::{CaptureReport, CheckpointExecutor, TargetState};
pub use inspect::{ContainerInspector, DockerInspector, InspectedContainer};
pub use pipeline::{CheckpointOutcome, Checkpointer};
pub use record::{CheckpointRecord, RecordWriter, RECORD_FILE};
pub use state::{CapturePhase, CaptureStateMachine};
pub use types::{CheckpointName, ContainerId, ProcessId};
