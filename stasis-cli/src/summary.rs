// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Human-readable summaries printed by the CLI.

use std::path::Path;

use stasis_core::RuntimeDescriptor;

/// One file in a checkpoint directory.
#[derive(Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub size: u64,
}

pub fn print_container_info(descriptor: &RuntimeDescriptor) {
    println!("Container Information:");
    println!("  ID:         {}", descriptor.id);
    println!("  Name:       {}", descriptor.name);
    println!("  PID:        {}", descriptor.process_id);
    println!("  State:      {}", descriptor.state);
    println!("  Runtime:    {}", descriptor.runtime_kind);
    println!("  RootFS:     {}", descriptor.filesystem_root.display());
    println!("  Bundle:     {}", descriptor.bundle_path.display());
    println!("  Cgroup:     {}", descriptor.cgroup_path);
    println!("  Namespaces:");
    for (kind, path) in &descriptor.namespace_handles {
        println!("    {}: {}", kind, path.display());
    }
}

/// List regular files in `dir`, sorted by name.
pub fn list_directory(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
            });
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
