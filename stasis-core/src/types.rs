// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Following the "Newtype" pattern in Rust to ensure valid state by construction.
//! All types validate their invariants at creation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Length of the abbreviated container identifier.
pub const SHORT_ID_LEN: usize = 12;

/// Maximum length of a checkpoint name.
const MAX_CHECKPOINT_NAME_LEN: usize = 64;

/// Validated container identifier as reported by the runtime.
/// Must be a non-empty string of hexadecimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerId(String);

impl ContainerId {
    /// Create a new ContainerId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, HardValidationError> {
        let id = id.into();

        if id.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "container_id",
                value: id,
                reason: "Container ID cannot be empty".to_string(),
            });
        }

        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "container_id",
                value: id,
                reason: "Container ID must contain only hexadecimal digits".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get the full identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the abbreviated identifier (first 12 characters).
    pub fn short(&self) -> &str {
        // Hex digits are ASCII, so byte slicing is char-aligned.
        &self.0[..self.0.len().min(SHORT_ID_LEN)]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContainerId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

/// Validated checkpoint name.
/// Used as a single path component, so it must not escape its parent directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckpointName(String);

impl CheckpointName {
    /// Create a new CheckpointName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "checkpoint_name",
                value: name,
                reason: "Checkpoint name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_CHECKPOINT_NAME_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "checkpoint_name",
                value: name.clone(),
                reason: format!(
                    "Checkpoint name too long: {} chars (max {})",
                    name.len(),
                    MAX_CHECKPOINT_NAME_LEN
                ),
            });
        }

        if name == "." || name == ".." {
            return Err(HardValidationError::InvalidFieldValue {
                field: "checkpoint_name",
                value: name,
                reason: "Checkpoint name cannot be a relative path component".to_string(),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "checkpoint_name",
                value: name,
                reason: "Checkpoint name must contain only alphanumeric characters, dots, hyphens, and underscores".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CheckpointName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CheckpointName> for String {
    fn from(name: CheckpointName) -> Self {
        name.0
    }
}

/// Validated process ID.
/// Must be positive (non-zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ProcessId(u32);

impl ProcessId {
    /// Create a new ProcessId with validation.
    pub fn new(pid: u32) -> Result<Self, HardValidationError> {
        if pid == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "process_id",
                value: "0".to_string(),
                reason: "Process ID 0 is reserved".to_string(),
            });
        }
        Ok(Self(pid))
    }

    /// Get the inner PID value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for ProcessId {
    type Error = HardValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProcessId> for u32 {
    fn from(pid: ProcessId) -> Self {
        pid.0
    }
}
