// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for Stasis.
//!
//! Every pipeline stage has its own variant so a failure always names the
//! stage it came from. No `Box<dyn Error>`, no `anyhow::Result`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a checkpoint attempt.
#[derive(Debug, Error)]
pub enum CheckpointError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Collection Errors
    // =========================================================================
    #[error("Container not found: {reference}")]
    NotFound { reference: String },

    #[error("Container {reference} is not running (state: {state})")]
    InvalidState { reference: String, state: String },

    #[error("Container inspection failed: {0}")]
    Inspection(#[source] InspectError),

    // =========================================================================
    // Image Directory Errors
    // =========================================================================
    #[error("Checkpoint directory {path} unusable: {reason}")]
    Configuration { path: PathBuf, reason: String },

    // =========================================================================
    // Capture Errors - No Fallback After a Failed Pre-Dump
    // =========================================================================
    #[error("Invalid capture state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    #[error("Pre-dump failed: {0}")]
    PreCaptureFailed(#[source] CriuError),

    #[error("Checkpoint dump failed: {source}{}", format_log(.log))]
    CaptureFailed {
        #[source]
        source: CriuError,
        /// Contents of the CRIU log, when it could be read back.
        log: Option<String>,
    },

    // =========================================================================
    // Persistence Errors - Raw Artifacts Remain Valid
    // =========================================================================
    #[error("Failed to persist checkpoint record to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckpointError {
    /// Pipeline stage the error originated in.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::HardValidation(_) | Self::ConfigNotFound { .. } | Self::ConfigParse { .. } => {
                "configuration"
            }
            Self::NotFound { .. } | Self::InvalidState { .. } | Self::Inspection(_) => {
                "collection"
            }
            Self::Configuration { .. } => "image directory",
            Self::InvalidStateTransition(_)
            | Self::PreCaptureFailed(_)
            | Self::CaptureFailed { .. } => "capture",
            Self::Persistence { .. } => "record",
        }
    }
}

fn format_log(log: &Option<String>) -> String {
    match log {
        Some(contents) => format!("\nCRIU log:\n{}", contents),
        None => String::new(),
    }
}

/// Hard validation errors abort before anything touches the system.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// State transition errors for the capture state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Failures of the container-runtime inspection service.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("No such container: {reference}")]
    NotFound { reference: String },

    #[error("Inspection service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Malformed inspection output: {reason}")]
    Malformed { reason: String },
}

/// Failures of the CRIU checkpoint primitive.
#[derive(Debug, Error)]
pub enum CriuError {
    #[error("CRIU binary not found at expected path")]
    BinaryNotFound,

    #[error("Failed to execute CRIU at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CRIU {action} exited with {status}: {stderr}")]
    Exited {
        action: &'static str,
        status: String,
        stderr: String,
    },
}

/// Result type alias using CheckpointError.
pub type StasisResult<T> = Result<T, CheckpointError>;
