use std::net::{IpAddr, Ipv6Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_native_tls::TlsConnector as TokioTlsConnector;
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts},
    system_conf::read_system_conf,
};
use url::Url;

use super::cli::CliArgs;
use super::probe_config::{EndpointConfig, FileConfig, TargetConfig};
use crate::error::{CheckError, Result};
use crate::http_probe::target::Target;

pub const DEFAULT_APP_PORT: u16 = 5000;
pub const DEFAULT_APP_STATUS_PATH: &str = "/status";
pub const DEFAULT_PROMETHEUS_PORT: u16 = 9090;
pub const DEFAULT_GRAFANA_PORT: u16 = 3000;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_REPORT_PATH: &str = "health_check_report.txt";

pub const APPLICATION_SECTION: &str = "APPLICATION STATUS";
pub const MONITORING_SECTION: &str = "MONITORING STATUS";

/// Port and path of one of the built-in endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    pub fn new(port: u16, path: impl Into<String>) -> Self {
        Self {
            port,
            path: path.into(),
        }
    }

    fn merged(overrides: &EndpointConfig, port: u16, path: &str) -> Self {
        Self {
            port: overrides.port.unwrap_or(port),
            path: overrides.path.clone().unwrap_or_else(|| path.to_string()),
        }
    }

    /// Builds `http://<host>:<port><path>`, bracketing IPv6 literals.
    pub fn url(&self, host: &str) -> Result<Url> {
        let host = match host.parse::<Ipv6Addr>() {
            Ok(_) => format!("[{host}]"),
            Err(_) => host.to_string(),
        };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let raw = format!("http://{host}:{}{path}", self.port);
        Url::parse(&raw).map_err(|source| CheckError::Url { url: raw, source })
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_host: String,
    pub monitoring_host: String,
    pub application: Endpoint,
    pub prometheus: Endpoint,
    pub grafana: Endpoint,
    pub timeout: Duration,
    pub report_path: PathBuf,
    pub dns_hosts: Vec<String>,
    pub extra_targets: Vec<TargetConfig>,
    pub strict: bool,
}

impl AppConfig {
    /// Configuration with the default ports, timeout and report path.
    pub fn new(app_host: impl Into<String>, monitoring_host: impl Into<String>) -> Self {
        Self {
            app_host: app_host.into(),
            monitoring_host: monitoring_host.into(),
            application: Endpoint::new(DEFAULT_APP_PORT, DEFAULT_APP_STATUS_PATH),
            prometheus: Endpoint::new(DEFAULT_PROMETHEUS_PORT, "/"),
            grafana: Endpoint::new(DEFAULT_GRAFANA_PORT, "/"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            dns_hosts: Vec::new(),
            extra_targets: Vec::new(),
            strict: false,
        }
    }

    /// Load the configuration file named by the command line (if any) and
    /// let command line values and their environment fallbacks override it.
    pub fn resolve(cli: CliArgs) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: CliArgs, file: FileConfig) -> Result<Self> {
        let app_host = non_empty(cli.app_host)
            .or(non_empty(file.app_instance_ip))
            .ok_or_else(|| {
                CheckError::config(
                    "application host is not set (use --app-host or APP_INSTANCE_IP)",
                )
            })?;
        let monitoring_host = non_empty(cli.monitoring_host)
            .or(non_empty(file.monitoring_instance_ip))
            .ok_or_else(|| {
                CheckError::config(
                    "monitoring host is not set (use --monitoring-host or MONITORING_INSTANCE_IP)",
                )
            })?;

        let timeout_seconds = cli
            .timeout_seconds
            .or(file.timeout_seconds)
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        if timeout_seconds == 0 {
            return Err(CheckError::config("timeout must be at least one second"));
        }

        let dns_hosts: Vec<String> = if cli.dns_hosts.is_empty() {
            file.dns_hosts.unwrap_or_default()
        } else {
            cli.dns_hosts
        }
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        tracing::debug!(?dns_hosts, timeout_seconds, "resolved probe settings");

        Ok(Self {
            app_host,
            monitoring_host,
            application: Endpoint::merged(&file.application, DEFAULT_APP_PORT, DEFAULT_APP_STATUS_PATH),
            prometheus: Endpoint::merged(&file.prometheus, DEFAULT_PROMETHEUS_PORT, "/"),
            grafana: Endpoint::merged(&file.grafana, DEFAULT_GRAFANA_PORT, "/"),
            timeout: Duration::from_secs(timeout_seconds),
            report_path: cli
                .output
                .or(file.report_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
            dns_hosts,
            extra_targets: file.targets,
            strict: cli.strict,
        })
    }

    /// The targets in probing order: the application, Prometheus, Grafana,
    /// then any extra targets from the configuration file.
    pub fn targets(&self) -> Result<Vec<Target>> {
        let mut targets = vec![
            Target::new(
                "Application",
                self.application.url(&self.app_host)?,
                APPLICATION_SECTION,
            )
            .capture_body(true),
            Target::new(
                "Prometheus",
                self.prometheus.url(&self.monitoring_host)?,
                MONITORING_SECTION,
            ),
            Target::new(
                "Grafana",
                self.grafana.url(&self.monitoring_host)?,
                MONITORING_SECTION,
            ),
        ];

        for extra in &self.extra_targets {
            let url = Url::parse(&extra.url).map_err(|source| CheckError::Url {
                url: extra.url.clone(),
                source,
            })?;
            let mut target = Target::new(&extra.name, url, &extra.section)
                .capture_body(extra.capture_body);
            if let Some(codes) = &extra.accepted_status_codes {
                target = target.accepted_status_codes(codes.clone());
            }
            targets.push(target);
        }

        Ok(targets)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        CheckError::config(format!("failed to read {}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "loaded configuration file");
    Ok(serde_yaml::from_str(&config_str)?)
}

/// Setup a TLS connector that accepts invalid certificates and host names.
/// It is only used to read the peer certificate's expiry date.
pub fn setup_tls_connector() -> Result<TokioTlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();
    builder.danger_accept_invalid_certs(true);
    builder.danger_accept_invalid_hostnames(true);
    let connector = builder.build()?;
    Ok(TokioTlsConnector::from(connector))
}

/// Setup a DNS resolver for timing lookups.
/// With no hosts the system configuration is used. Otherwise the listed
/// name servers are queried over TCP with 2 attempts and a 100 millisecond
/// timeout. Either way a single query never outlives `probe_timeout`.
pub fn setup_resolver(dns_hosts: &[String], probe_timeout: Duration) -> Result<TokioAsyncResolver> {
    if dns_hosts.is_empty() {
        let (resolver_config, mut opts) = read_system_conf()?;
        opts.timeout = opts.timeout.min(probe_timeout);
        opts.attempts = 1;
        return Ok(TokioAsyncResolver::tokio(resolver_config, opts));
    }

    let mut opts = ResolverOpts::default();
    opts.attempts = 2;
    opts.timeout = Duration::from_millis(100).min(probe_timeout);

    let mut name_servers = NameServerConfigGroup::new();

    for host in dns_hosts {
        let ip: IpAddr = host.parse().map_err(|source| CheckError::DnsHost {
            host: host.clone(),
            source,
        })?;
        name_servers.push(NameServerConfig {
            socket_addr: (ip, 53).into(),
            protocol: Protocol::Tcp,
            tls_dns_name: None,
            trust_negative_responses: false,
            bind_addr: None,
        });
    }

    let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
    Ok(TokioAsyncResolver::tokio(resolver_config, opts))
}
