// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod checkpoint;
pub mod inspect;
pub mod validate;

use stasis_core::{Config, ConfigLoader, StasisResult};

/// Load the config file when given, otherwise fall back to defaults.
pub fn load_config(path: Option<&str>) -> StasisResult<Config> {
    match path {
        Some(path) => ConfigLoader::load_file(path),
        None => Ok(Config::default()),
    }
}
