use std::path::PathBuf;

use clap::Parser;

/// Command line surface. Environment lookups happen here and nowhere else;
/// everything downstream receives an explicit `AppConfig`.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "stackcheck", version)]
#[command(about = "Probe the application and monitoring stack once and append the results to a report")]
pub struct CliArgs {
    /// Optional YAML configuration file.
    #[arg(long, short, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Address of the application instance.
    #[arg(long, env = "APP_INSTANCE_IP")]
    pub app_host: Option<String>,

    /// Address of the instance running Prometheus and Grafana.
    #[arg(long, env = "MONITORING_INSTANCE_IP")]
    pub monitoring_host: Option<String>,

    /// Per-probe timeout.
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Report file, appended to on every run.
    #[arg(long, short, env = "REPORT_FILE")]
    pub output: Option<PathBuf>,

    /// Name servers used for DNS timing. Empty means the system configuration.
    #[arg(long, env = "DNS_HOSTS", value_delimiter = ',')]
    pub dns_hosts: Vec<String>,

    /// Exit with status 2 when any target is not responding.
    #[arg(long)]
    pub strict: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,
}
