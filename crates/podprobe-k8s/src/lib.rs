//! Kubernetes client for podprobe
//!
//! This crate provides Kubernetes API integration for loading credentials
//! and listing or fetching pods.

mod client;

pub use client::{KubeClient, PodLookup};

// Re-export types that are used in our public API
pub use podprobe_types::{ContainerInfo, ContextInfo, PodInfo, PodStatus};
