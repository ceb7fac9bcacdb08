// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CRIU request building and invocation.

mod client;
mod request;

pub use client::{CheckpointPrimitive, CriuClient};
pub use request::{CheckpointOptions, CheckpointRequest, CriuOptions, ImageDir, RequestBuilder};
