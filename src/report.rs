//! Report rendering for pod listings

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Deserialize;

use podprobe_k8s::{ContextInfo, PodInfo, PodLookup};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print every pod in the listing
pub fn render_pods(out: &mut impl Write, format: OutputFormat, pods: &[PodInfo]) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "\nThere are {} pods in the cluster", pods.len())?;
            for pod in pods {
                write_pod(out, pod)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, pods)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Print the result of a single pod lookup
pub fn render_lookup(
    out: &mut impl Write,
    format: OutputFormat,
    namespace: &str,
    name: &str,
    lookup: &PodLookup,
) -> Result<()> {
    match (format, lookup) {
        (OutputFormat::Text, PodLookup::Found(pod)) => {
            writeln!(out, "Found pod {} in namespace {}", name, namespace)?;
            write_pod(out, pod)?;
        }
        (OutputFormat::Text, PodLookup::NotFound) => {
            writeln!(out, "Pod {} in namespace {} not found", name, namespace)?;
        }
        (OutputFormat::Json, PodLookup::Found(pod)) => {
            serde_json::to_writer_pretty(&mut *out, pod)?;
            writeln!(out)?;
        }
        (OutputFormat::Json, PodLookup::NotFound) => {
            writeln!(out, "null")?;
        }
    }
    Ok(())
}

/// Print kubeconfig contexts, current one marked with `*`
pub fn render_contexts(
    out: &mut impl Write,
    format: OutputFormat,
    contexts: &[ContextInfo],
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for ctx in contexts {
                let marker = if ctx.is_current { "*" } else { " " };
                writeln!(
                    out,
                    "{} {}\tcluster={}\tuser={}\tnamespace={}",
                    marker,
                    ctx.name,
                    ctx.cluster,
                    ctx.user,
                    ctx.namespace.as_deref().unwrap_or("-")
                )?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, contexts)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_pod(out: &mut impl Write, pod: &PodInfo) -> std::io::Result<()> {
    writeln!(out, "Name of the pod : {}", pod.name)?;
    for container in &pod.containers {
        writeln!(
            out,
            "\t\t\t Container : {}. Image : {}",
            container.name, container.image
        )?;
        for arg in &container.args {
            writeln!(out, "\t\t\tCommandine arguments for container : {}", arg)?;
        }
        for cmd in &container.command {
            writeln!(out, "\t\t\tCommand for container: {}", cmd)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podprobe_k8s::ContainerInfo;

    fn figlet() -> PodInfo {
        let mut pod = PodInfo::new("figlet-5d8f7".to_string(), "openfaas-fn".to_string());
        let mut container = ContainerInfo::new(
            "figlet".to_string(),
            "functions/figlet:latest".to_string(),
        );
        container.command = vec!["fwatchdog".to_string()];
        container.args = vec!["--port".to_string(), "8080".to_string()];
        pod.containers.push(container);
        pod
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_listing() {
        let mut bare = PodInfo::new("bare".to_string(), "openfaas-fn".to_string());
        bare.containers
            .push(ContainerInfo::new("app".to_string(), "nginx".to_string()));

        let text = render(|out| render_pods(out, OutputFormat::Text, &[figlet(), bare]));
        assert_eq!(
            text,
            "\nThere are 2 pods in the cluster\n\
             Name of the pod : figlet-5d8f7\n\
             \t\t\t Container : figlet. Image : functions/figlet:latest\n\
             \t\t\tCommandine arguments for container : --port\n\
             \t\t\tCommandine arguments for container : 8080\n\
             \t\t\tCommand for container: fwatchdog\n\
             Name of the pod : bare\n\
             \t\t\t Container : app. Image : nginx\n"
        );
    }

    #[test]
    fn test_text_empty_namespace() {
        let text = render(|out| render_pods(out, OutputFormat::Text, &[]));
        assert_eq!(text, "\nThere are 0 pods in the cluster\n");
    }

    #[test]
    fn test_json_listing() {
        let text = render(|out| render_pods(out, OutputFormat::Json, &[figlet()]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["name"], "figlet-5d8f7");
        assert_eq!(value[0]["containers"][0]["args"][1], "8080");
    }

    #[test]
    fn test_lookup_messages() {
        let found = render(|out| {
            render_lookup(
                out,
                OutputFormat::Text,
                "openfaas-fn",
                "figlet-5d8f7",
                &PodLookup::Found(figlet()),
            )
        });
        assert!(found.starts_with("Found pod figlet-5d8f7 in namespace openfaas-fn\n"));
        assert!(found.contains("Name of the pod : figlet-5d8f7\n"));

        let missing = render(|out| {
            render_lookup(
                out,
                OutputFormat::Text,
                "openfaas-fn",
                "example-xxxxx",
                &PodLookup::NotFound,
            )
        });
        assert_eq!(missing, "Pod example-xxxxx in namespace openfaas-fn not found\n");

        let json = render(|out| {
            render_lookup(out, OutputFormat::Json, "ns", "gone", &PodLookup::NotFound)
        });
        assert_eq!(json, "null\n");
    }

    #[test]
    fn test_contexts() {
        let contexts = vec![
            ContextInfo::new(
                "dev".to_string(),
                "dev-cluster".to_string(),
                "dev-user".to_string(),
                Some("openfaas-fn".to_string()),
                true,
            ),
            ContextInfo::new(
                "prod".to_string(),
                "prod-cluster".to_string(),
                "admin".to_string(),
                None,
                false,
            ),
        ];

        let text = render(|out| render_contexts(out, OutputFormat::Text, &contexts));
        assert_eq!(
            text,
            "* dev\tcluster=dev-cluster\tuser=dev-user\tnamespace=openfaas-fn\n  \
             prod\tcluster=prod-cluster\tuser=admin\tnamespace=-\n"
        );
    }
}
