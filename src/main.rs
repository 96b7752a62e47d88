use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use podprobe_k8s::KubeClient;
use podprobe_net::{Connectivity, ConnectivityProbe};

mod config;
mod report;

use config::{ProbeSettings, Settings};
use report::OutputFormat;

/// Podprobe - list the containers, images and commands of the pods in a namespace
#[derive(Parser, Debug)]
#[command(name = "podprobe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Absolute path to the kubeconfig file [default: ~/.kube/config]
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long)]
    context: Option<String>,

    /// Namespace to list pods in [default: openfaas-fn]
    #[arg(short, long)]
    namespace: Option<String>,

    /// Only list pods matching this label selector
    #[arg(short = 'l', long)]
    selector: Option<String>,

    /// Look up a single pod by name instead of listing
    #[arg(long, value_name = "NAME")]
    pod: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Do not probe internet connectivity before contacting the cluster
    #[arg(long)]
    skip_connectivity_check: bool,

    /// URL used for the connectivity probe
    #[arg(long, value_name = "URL")]
    probe_url: Option<String>,

    /// Echo the probe response body to stdout
    #[arg(long)]
    dump_probe_body: bool,

    /// List kubeconfig contexts and exit
    #[arg(long)]
    list_contexts: bool,

    /// Config file [default: ~/.podprobe/config.toml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    let default_filter = if args.verbose {
        "warn,podprobe=debug,podprobe_k8s=debug,podprobe_net=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let settings = Settings::load(&args)?;
    let mut stdout = std::io::stdout().lock();

    if settings.list_contexts {
        let kube_client = load_credentials(&settings)?;
        list_contexts(&kube_client, settings.output, &mut stdout)?;
        return Ok(ExitCode::SUCCESS);
    }

    if settings.probe.enabled && !probe_connectivity(&settings.probe, &mut stdout).await? {
        return Ok(ExitCode::FAILURE);
    }

    let kube_client = load_credentials(&settings)?;
    let client = kube_client.client(settings.context.as_deref()).await?;

    match &settings.pod {
        Some(name) => {
            let lookup = kube_client
                .get_pod(&client, &settings.namespace, name)
                .await?;
            report::render_lookup(
                &mut stdout,
                settings.output,
                &settings.namespace,
                name,
                &lookup,
            )?;
        }
        None => {
            let pods = kube_client
                .list_pods(&client, &settings.namespace, settings.selector.as_deref())
                .await?;
            info!(namespace = %settings.namespace, count = pods.len(), "listed pods");
            report::render_pods(&mut stdout, settings.output, &pods)?;
        }
    }

    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn load_credentials(settings: &Settings) -> Result<KubeClient> {
    match &settings.kubeconfig {
        Some(path) => KubeClient::from_path(path),
        None => Ok(KubeClient::inferred()),
    }
}

fn list_contexts(
    kube_client: &KubeClient,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if kube_client.is_inferred() {
        warn!("no kubeconfig path known; credentials are inferred and have no contexts");
        if format == OutputFormat::Text {
            writeln!(out, "No kubeconfig loaded; credentials are inferred from the environment")?;
            return Ok(());
        }
    }
    report::render_contexts(out, format, &kube_client.get_contexts())
}

/// Returns false when the probe got a non-200 answer
async fn probe_connectivity(settings: &ProbeSettings, out: &mut impl Write) -> Result<bool> {
    let probe = ConnectivityProbe::new(settings.url.clone())
        .timeout(settings.timeout)
        .accept_invalid_certs(settings.accept_invalid_certs);

    let connectivity = probe
        .check()
        .await
        .context("Internet connectivity could not be tested. Prerequisites missing")?;

    match connectivity {
        Connectivity::Online { body } => {
            info!(url = probe.url(), "internet connectivity ok");
            if settings.dump_body {
                out.write_all(body.as_bytes())?;
            }
            Ok(true)
        }
        Connectivity::Offline { status } => {
            warn!(url = probe.url(), status, "connectivity probe failed");
            writeln!(out, "No internet connectivity.Exiting")?;
            Ok(false)
        }
    }
}
