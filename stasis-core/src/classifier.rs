// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! External-resource classification.
//!
//! Mounts owned by the host or the runtime are not part of the guest
//! process's state. Capturing them produces images that cannot be restored,
//! so each one is declared external and re-attached by whoever restores.

use std::fmt;

use serde::Serialize;

use crate::collector::RuntimeDescriptor;

/// A bind mount declared external to the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExternalMount {
    /// Mount point inside the container.
    pub mountpoint: &'static str,
    /// Key the mount is re-attached under on restore.
    pub key: &'static str,
}

impl fmt::Display for ExternalMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mnt[{}]:{}", self.mountpoint, self.key)
    }
}

/// Runtime-managed mounts, in the order they are handed to CRIU.
pub const EXTERNAL_MOUNTS: [ExternalMount; 10] = [
    ExternalMount {
        mountpoint: "/proc",
        key: "proc",
    },
    ExternalMount {
        mountpoint: "/dev",
        key: "dev",
    },
    ExternalMount {
        mountpoint: "/sys",
        key: "sys",
    },
    ExternalMount {
        mountpoint: "/dev/shm",
        key: "shm",
    },
    ExternalMount {
        mountpoint: "/dev/pts",
        key: "pts",
    },
    ExternalMount {
        mountpoint: "/dev/mqueue",
        key: "mqueue",
    },
    ExternalMount {
        mountpoint: "/etc/hostname",
        key: "hostname",
    },
    ExternalMount {
        mountpoint: "/etc/hosts",
        key: "hosts",
    },
    ExternalMount {
        mountpoint: "/etc/resolv.conf",
        key: "resolv.conf",
    },
    ExternalMount {
        mountpoint: "/sys/fs/cgroup",
        key: "cgroup",
    },
];

/// Cgroup controllers whose root is bound for the operation.
pub const TRACKED_CONTROLLERS: [&str; 2] = ["cpu", "memory"];

/// Binding of one cgroup controller to the container's cgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CgroupRoot {
    pub controller: &'static str,
    pub path: String,
}

impl fmt::Display for CgroupRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.controller, self.path)
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub external_mounts: Vec<ExternalMount>,
    pub cgroup_roots: Vec<CgroupRoot>,
}

/// Cgroup path of the container, synthesizing `/<prefix>/<id>` when the
/// runtime reported none.
pub fn resolve_cgroup_path(descriptor: &RuntimeDescriptor, cgroup_prefix: &str) -> String {
    if descriptor.cgroup_path.is_empty() {
        format!("/{}/{}", cgroup_prefix, descriptor.id)
    } else {
        descriptor.cgroup_path.clone()
    }
}

/// Classify the resources that must stay outside the capture.
///
/// Total over every descriptor: only the cgroup path influences the result.
pub fn classify(descriptor: &RuntimeDescriptor, cgroup_prefix: &str) -> Classification {
    let cgroup_path = resolve_cgroup_path(descriptor, cgroup_prefix);

    let cgroup_roots = TRACKED_CONTROLLERS
        .iter()
        .map(|controller| CgroupRoot {
            controller: *controller,
            path: cgroup_path.clone(),
        })
        .collect();

    Classification {
        external_mounts: EXTERNAL_MOUNTS.to_vec(),
        cgroup_roots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::types::{ContainerId, ProcessId};

    fn descriptor(pid: u32, root: &str, cgroup_path: &str) -> RuntimeDescriptor {
        RuntimeDescriptor {
            id: ContainerId::new("9f1c2b3a4d5e").unwrap(),
            name: "web1".to_string(),
            process_id: ProcessId::new(pid).unwrap(),
            state: "running".to_string(),
            filesystem_root: PathBuf::from(root),
            runtime_kind: "runc".to_string(),
            bundle_path: PathBuf::from("/run/docker/runtime-runc/moby/9f1c2b3a4d5e"),
            cgroup_path: cgroup_path.to_string(),
            namespace_handles: BTreeMap::new(),
        }
    }

    #[test]
    fn test_external_mount_format() {
        let rendered: Vec<String> = EXTERNAL_MOUNTS.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "mnt[/proc]:proc",
                "mnt[/dev]:dev",
                "mnt[/sys]:sys",
                "mnt[/dev/shm]:shm",
                "mnt[/dev/pts]:pts",
                "mnt[/dev/mqueue]:mqueue",
                "mnt[/etc/hostname]:hostname",
                "mnt[/etc/hosts]:hosts",
                "mnt[/etc/resolv.conf]:resolv.conf",
                "mnt[/sys/fs/cgroup]:cgroup",
            ]
        );
    }

    #[test]
    fn test_synthesized_cgroup_root() {
        let classification = classify(&descriptor(4321, "/merged", ""), "docker");
        assert_eq!(
            classification.cgroup_roots,
            vec![
                CgroupRoot {
                    controller: "cpu",
                    path: "/docker/9f1c2b3a4d5e".to_string(),
                },
                CgroupRoot {
                    controller: "memory",
                    path: "/docker/9f1c2b3a4d5e".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_reported_cgroup_path_wins() {
        let classification = classify(&descriptor(4321, "/merged", "/custom/parent"), "docker");
        assert!(classification
            .cgroup_roots
            .iter()
            .all(|root| root.path == "/custom/parent"));
    }

    #[test]
    fn test_independent_of_pid_and_root() {
        let a = classify(&descriptor(1, "/a", ""), "docker");
        let b = classify(&descriptor(99999, "/somewhere/else", ""), "docker");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cgroup_root_display() {
        let root = CgroupRoot {
            controller: "memory",
            path: "/docker/abc".to_string(),
        };
        assert_eq!(root.to_string(), "memory:/docker/abc");
    }
}
