// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `stasis validate` command - Validate configuration file.

use stasis_core::ConfigLoader;

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("CRIU Settings:");
            match &config.criu.path {
                Some(path) => println!("  Binary:          {}", path.display()),
                None => println!("  Binary:          (discovered at runtime)"),
            }
            println!("  Log Level:       {}", config.criu.log_level);
            println!("  Log File:        {}", config.criu.log_file);
            println!();
            println!("Inspector Settings:");
            println!("  Binary:          {}", config.inspector.binary.display());
            println!("  Default Runtime: {}", config.inspector.default_runtime);
            println!("  Cgroup Prefix:   {}", config.inspector.cgroup_prefix);
            println!("  Bundle Root:     {}", config.inspector.bundle_root.display());
            println!();
            println!("Checkpoint Directory: {}", config.base_dir.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
