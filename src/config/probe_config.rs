use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_SECTION: &str = "ADDITIONAL CHECKS";

/// The YAML configuration file for stackcheck.
/// Every field is optional: command line flags and environment variables
/// override or fill in whatever is missing here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Address of the application instance.
    pub app_instance_ip: Option<String>,

    /// Address of the instance running Prometheus and Grafana.
    pub monitoring_instance_ip: Option<String>,

    /// Per-probe timeout in seconds.
    pub timeout_seconds: Option<u64>,

    /// Report file, appended to on every run.
    pub report_path: Option<PathBuf>,

    /// Name servers used to time DNS lookups.
    pub dns_hosts: Option<Vec<String>>,

    pub application: EndpointConfig,
    pub prometheus: EndpointConfig,
    pub grafana: EndpointConfig,

    /// Extra targets probed after the built-in ones.
    pub targets: Vec<TargetConfig>,
}

/// Port and path overrides for one of the built-in endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub port: Option<u16>,
    pub path: Option<String>,
}

/// An additional target listed in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Name printed in the report, e.g. `Node Exporter`.
    pub name: String,

    /// Full URL of the endpoint.
    pub url: String,

    /// Report section the result is listed under.
    #[serde(default = "default_section")]
    pub section: String,

    /// Copy the response body into the report when the target responds.
    #[serde(default)]
    pub capture_body: bool,

    /// The accepted HTTP status codes. Any 2xx when not specified.
    /// Redirects are not followed, so 3xx codes may be listed here.
    #[serde(default)]
    pub accepted_status_codes: Option<Vec<u16>>,
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}
