// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `stasis inspect` command - Show what a checkpoint would capture.

use stasis_core::{classify, Collector, DockerInspector};

use crate::summary;

pub async fn execute(
    config_path: Option<&str>,
    container: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let collector = Collector::new(
        DockerInspector::new(&config.inspector.binary),
        config.inspector.clone(),
    );
    let descriptor = collector.collect(container)?;
    let classification = classify(&descriptor, &config.inspector.cgroup_prefix);

    if json {
        let value = serde_json::json!({
            "container": descriptor,
            "exclusions": classification,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    summary::print_container_info(&descriptor);
    println!();
    println!("External mounts:");
    for mount in &classification.external_mounts {
        println!("  {}", mount);
    }
    println!("Cgroup roots:");
    for root in &classification.cgroup_roots {
        println!("  {}", root);
    }

    Ok(())
}
