//! Kubernetes client for podprobe

use std::path::Path;

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use tracing::{debug, info};

use podprobe_types::{ContainerInfo, ContextInfo, PodInfo, PodStatus};

/// Result of looking up a single pod by name
#[derive(Clone, Debug)]
pub enum PodLookup {
    Found(PodInfo),
    NotFound,
}

/// Kubernetes client wrapper
pub struct KubeClient {
    /// `None` when credentials are inferred from the environment
    kubeconfig: Option<Kubeconfig>,
    current_context: Option<String>,
}

impl KubeClient {
    /// Load the kubeconfig at `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path).context(format!(
            "Failed to read kubeconfig at {}",
            path.display()
        ))?;
        debug!(path = %path.display(), "loaded kubeconfig");

        Ok(Self::from_kubeconfig(kubeconfig))
    }

    /// Wrap an already parsed kubeconfig
    pub fn from_kubeconfig(kubeconfig: Kubeconfig) -> Self {
        let current_context = kubeconfig.current_context.clone();

        Self {
            kubeconfig: Some(kubeconfig),
            current_context,
        }
    }

    /// Infer credentials from the environment (`KUBECONFIG` or the in-cluster
    /// service account). Used when no kubeconfig path is known.
    pub fn inferred() -> Self {
        Self {
            kubeconfig: None,
            current_context: None,
        }
    }

    /// Whether credentials come from the environment rather than a kubeconfig file
    pub fn is_inferred(&self) -> bool {
        self.kubeconfig.is_none()
    }

    /// Get all available contexts from kubeconfig
    pub fn get_contexts(&self) -> Vec<ContextInfo> {
        let Some(kubeconfig) = &self.kubeconfig else {
            return Vec::new();
        };

        kubeconfig
            .contexts
            .iter()
            .map(|ctx| {
                let context = ctx.context.as_ref();
                ContextInfo::new(
                    ctx.name.clone(),
                    context.map(|c| c.cluster.clone()).unwrap_or_default(),
                    context.and_then(|c| c.user.clone()).unwrap_or_default(),
                    context.and_then(|c| c.namespace.clone()),
                    Some(&ctx.name) == self.current_context.as_ref(),
                )
            })
            .collect()
    }

    /// Get the current context name
    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    /// Create a kube::Client, using `context` or the kubeconfig's current context
    pub async fn client(&self, context: Option<&str>) -> Result<kube::Client> {
        let config = match &self.kubeconfig {
            Some(kubeconfig) => {
                if let Some(name) = context {
                    if !kubeconfig.contexts.iter().any(|c| c.name == name) {
                        anyhow::bail!("Context '{}' not found in kubeconfig", name);
                    }
                }

                let context = context.or(self.current_context());
                info!(context = context.unwrap_or("<none>"), "using kubeconfig context");

                kube::Config::from_custom_kubeconfig(
                    kubeconfig.clone(),
                    &KubeConfigOptions {
                        context: context.map(str::to_string),
                        ..Default::default()
                    },
                )
                .await
                .context("Failed to build client config from kubeconfig")?
            }
            None => {
                info!("no kubeconfig path, inferring cluster config");
                kube::Config::infer()
                    .await
                    .context("Failed to infer cluster config")?
            }
        };

        debug!(cluster_url = %config.cluster_url, "connecting to cluster");
        kube::Client::try_from(config).context("Failed to create Kubernetes client")
    }

    /// Fetch the pods in a namespace, optionally narrowed by a label selector
    pub async fn list_pods(
        &self,
        client: &kube::Client,
        namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<PodInfo>> {
        let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);

        let mut params = ListParams::default();
        if let Some(selector) = selector {
            params = params.labels(selector);
        }

        let list = pods
            .list(&params)
            .await
            .context(format!("Failed to list pods in {}", namespace))?;
        debug!(namespace, count = list.items.len(), "listed pods");

        Ok(list
            .items
            .into_iter()
            .map(|pod| Self::pod_to_info(pod, namespace))
            .collect())
    }

    /// Fetch a single pod by name
    pub async fn get_pod(
        &self,
        client: &kube::Client,
        namespace: &str,
        name: &str,
    ) -> Result<PodLookup> {
        let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);

        match pods.get_opt(name).await {
            Ok(Some(pod)) => Ok(PodLookup::Found(Self::pod_to_info(pod, namespace))),
            Ok(None) => Ok(PodLookup::NotFound),
            Err(kube::Error::Api(status)) => anyhow::bail!(
                "Error getting pod {} in namespace {}: {}",
                name,
                namespace,
                status.message
            ),
            Err(e) => Err(e).context(format!(
                "Failed to get pod '{}' in namespace '{}'",
                name, namespace
            )),
        }
    }

    /// Convert a k8s Pod to PodInfo
    pub fn pod_to_info(pod: Pod, namespace: &str) -> PodInfo {
        let name = pod.metadata.name.unwrap_or_default();
        let namespace = pod
            .metadata
            .namespace
            .unwrap_or_else(|| namespace.to_string());
        let mut info = PodInfo::new(name, namespace);

        if let Some(spec) = pod.spec {
            info.node_name = spec.node_name;
            info.containers = spec
                .containers
                .into_iter()
                .map(|c| {
                    let mut container = ContainerInfo::new(c.name, c.image.unwrap_or_default());
                    container.command = c.command.unwrap_or_default();
                    container.args = c.args.unwrap_or_default();
                    container
                })
                .collect();
        }

        info.status = pod
            .status
            .and_then(|s| s.phase)
            .as_deref()
            .map(PodStatus::from)
            .unwrap_or(PodStatus::Unknown);

        info
    }
}
