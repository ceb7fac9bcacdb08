// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `stasis checkpoint` command - Checkpoint a running container.
//!
//! The capture blocks for as long as CRIU keeps the target frozen, so the
//! pipeline runs on the blocking pool.

use std::path::PathBuf;

use stasis_core::{
    CheckpointError, CheckpointName, CheckpointOptions, CheckpointOutcome, Checkpointer,
    CriuClient, DockerInspector,
};

use crate::summary;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub async fn execute(
    config_path: Option<&str>,
    container: &str,
    name: &str,
    dir: Option<String>,
    options: CheckpointOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let name = CheckpointName::new(name)?;
    let base_dir = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| config.base_dir.clone());

    tracing::info!(
        container = %container,
        checkpoint = %name,
        base_dir = %base_dir.display(),
        "Starting checkpoint"
    );
    println!("Starting checkpoint of container '{}'...", container);

    let reference = container.to_string();
    let result = tokio::task::spawn_blocking(move || -> Result<CheckpointOutcome, BoxError> {
        let criu = match &config.criu.path {
            Some(path) => CriuClient::new(path),
            None => CriuClient::discover()?,
        };
        let inspector = DockerInspector::new(&config.inspector.binary);
        let checkpointer = Checkpointer::new(inspector, criu, &config);

        Ok(checkpointer.run(&reference, &name, &base_dir, &options)?)
    })
    .await?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("✗ Checkpoint failed:");
            eprintln!("  {}", e);
            if let Some(err) = e.downcast_ref::<CheckpointError>() {
                eprintln!("  (stage: {})", err.stage());
                let after_pre_dump = options.enable_pre_dump
                    && matches!(err, CheckpointError::CaptureFailed { .. });
                if after_pre_dump {
                    // The target's run state is not guaranteed after a dump that followed a pre-dump.
                    eprintln!("  Verify the container is still running before retrying.");
                }
            }
            std::process::exit(1);
        }
    };

    println!();
    summary::print_container_info(&outcome.descriptor);

    if !outcome.target_matches(&options) {
        println!();
        println!(
            "⚠ Container process was expected to be {} but was observed {:?}",
            if options.leave_running { "running" } else { "stopped" },
            outcome.target
        );
    }

    println!();
    println!("✓ Checkpoint successful");
    println!();
    println!("Checkpoint stored in: {}", outcome.directory.display());
    println!();
    println!("Checkpoint contents:");
    for entry in summary::list_directory(&outcome.directory)? {
        println!("  {} ({} bytes)", entry.name, entry.size);
    }

    Ok(())
}
