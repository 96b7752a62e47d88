//! Shared types for podprobe
//!
//! This crate contains the data structures passed between the Kubernetes
//! client and the report renderer.

use serde::Serialize;

// ============================================================================
// Kubernetes Resource Types
// ============================================================================

/// Kubernetes context information
#[derive(Clone, Debug, Serialize)]
pub struct ContextInfo {
    pub name: String,
    pub cluster: String,
    pub user: String,
    pub namespace: Option<String>,
    pub is_current: bool,
}

impl ContextInfo {
    pub fn new(
        name: String,
        cluster: String,
        user: String,
        namespace: Option<String>,
        is_current: bool,
    ) -> Self {
        Self {
            name,
            cluster,
            user,
            namespace,
            is_current,
        }
    }
}

/// Pod information
#[derive(Clone, Debug, Serialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub status: PodStatus,
    pub node_name: Option<String>,
    /// Containers in the order they appear in the pod spec
    pub containers: Vec<ContainerInfo>,
}

impl PodInfo {
    pub fn new(name: String, namespace: String) -> Self {
        Self {
            name,
            namespace,
            status: PodStatus::Unknown,
            node_name: None,
            containers: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PodStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<&str> for PodStatus {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// A container from a pod spec
#[derive(Clone, Debug, Default, Serialize)]
pub struct ContainerInfo {
    pub name: String,
    /// Empty when the spec leaves the image to a higher-level controller
    pub image: String,
    /// Entrypoint override
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl ContainerInfo {
    pub fn new(name: String, image: String) -> Self {
        Self {
            name,
            image,
            command: Vec::new(),
            args: Vec::new(),
        }
    }
}
