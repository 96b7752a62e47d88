//! Layered configuration: built-in defaults, then the TOML file, then CLI flags

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use podprobe_net::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL};

use crate::Args;
use crate::report::OutputFormat;

/// Namespace listed when neither the config file nor the CLI names one
pub const DEFAULT_NAMESPACE: &str = "openfaas-fn";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub selector: Option<String>,
    pub output: Option<OutputFormat>,
    pub probe: ProbeFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeFileConfig {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub accept_invalid_certs: Option<bool>,
}

impl FileConfig {
    /// Default config file location
    fn default_path(home: Option<&Path>) -> Option<PathBuf> {
        Some(home?.join(".podprobe").join("config.toml"))
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).context(format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the explicit config file, or the default one when it exists
    fn discover(explicit: Option<&Path>, home: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path(home) {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "using default config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Connectivity probe settings after merging
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeSettings {
    pub enabled: bool,
    pub url: String,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    pub dump_body: bool,
}

/// Effective settings for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub namespace: String,
    /// `None` means credentials are inferred from the environment
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub selector: Option<String>,
    pub pod: Option<String>,
    pub output: OutputFormat,
    pub list_contexts: bool,
    pub probe: ProbeSettings,
}

impl Settings {
    /// Resolve settings for `args` against the user's home directory
    pub fn load(args: &Args) -> Result<Self> {
        let home = home_dir(env::var_os("HOME"), env::var_os("USERPROFILE"));
        let file = FileConfig::discover(args.config.as_deref(), home.as_deref())?;
        Ok(Self::resolve(args, file, home.as_deref()))
    }

    /// Merge CLI flags over the file config over defaults
    pub fn resolve(args: &Args, file: FileConfig, home: Option<&Path>) -> Self {
        let kubeconfig = args
            .kubeconfig
            .clone()
            .or(file.kubeconfig)
            .or_else(|| default_kubeconfig(home));

        let probe = ProbeSettings {
            enabled: !args.skip_connectivity_check && file.probe.enabled.unwrap_or(true),
            url: args
                .probe_url
                .clone()
                .or(file.probe.url)
                .unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
            timeout: file
                .probe
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PROBE_TIMEOUT),
            accept_invalid_certs: file.probe.accept_invalid_certs.unwrap_or(true),
            dump_body: args.dump_probe_body,
        };

        Self {
            namespace: args
                .namespace
                .clone()
                .or(file.namespace)
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            kubeconfig,
            context: args.context.clone().or(file.context),
            selector: args.selector.clone().or(file.selector),
            pod: args.pod.clone(),
            output: args.output.or(file.output).unwrap_or_default(),
            list_contexts: args.list_contexts,
            probe,
        }
    }
}

/// `HOME`, falling back to `USERPROFILE` on Windows. Empty values count as unset.
fn home_dir(home: Option<OsString>, userprofile: Option<OsString>) -> Option<PathBuf> {
    home.filter(|h| !h.is_empty())
        .or_else(|| userprofile.filter(|h| !h.is_empty()))
        .map(PathBuf::from)
}

/// `<home>/.kube/config`, or nothing when the home directory is unknown
fn default_kubeconfig(home: Option<&Path>) -> Option<PathBuf> {
    let home = home.filter(|h| !h.as_os_str().is_empty())?;
    Some(home.join(".kube").join("config"))
}
