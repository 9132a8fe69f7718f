//! Command-line argument parsing
//!
//! Every flag can also be set through a `KMET_*` environment variable.

use clap::Parser;
use std::path::PathBuf;

/// Live terminal dashboard for Kubernetes pod and node usage
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Show a synthetic cluster instead of connecting to one
    #[arg(long, env = "KMET_MOCK")]
    pub mock: bool,

    /// Kubeconfig file (defaults to $KUBECONFIG, ~/.kube/config or in-cluster credentials)
    #[arg(long, env = "KMET_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, env = "KMET_CONTEXT")]
    pub context: Option<String>,

    /// Initial namespace; `all` selects every namespace
    #[arg(short, long, env = "KMET_NAMESPACE")]
    pub namespace: Option<String>,

    /// Label selector for pods, e.g. `app=api`
    #[arg(short = 'l', long, env = "KMET_SELECTOR")]
    pub selector: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(long, env = "KMET_REFRESH_MS")]
    pub refresh_ms: Option<u64>,

    /// Optional TOML configuration file
    #[arg(short, long, env = "KMET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Diagnostic log file (stdout is taken by the dashboard)
    #[arg(long, env = "KMET_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "KMET_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Keep running when esc is pressed with no pane open
    #[arg(long, env = "KMET_NO_ESC_QUIT")]
    pub no_esc_quit: bool,
}

impl Args {
    /// Cluster connection parameters for the live provider
    #[cfg(feature = "kube")]
    #[must_use]
    pub fn kube_settings(&self) -> crate::provider::KubeSettings {
        crate::provider::KubeSettings {
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
        }
    }
}
