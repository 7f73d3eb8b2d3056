use std::fmt;

pub const RUNNING: &str = "RUNNING";
pub const NOT_RESPONDING: &str = "NOT RESPONDING";

/// Why a probe counted as unreachable. The report only ever prints
/// `NOT RESPONDING`; the cause is kept for logs and the console summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    Connect,
    Status(u16),
    Request,
}

impl ProbeFailure {
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect
        } else {
            Self::Request
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::Request => write!(f, "request failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub target_name: String,
    pub url: String,
    pub reachable: bool,
    pub body: Option<String>,
    /// Whether the target asked for its body; distinguishes "not requested"
    /// from "could not be read".
    pub capture_body: bool,
    pub failure: Option<ProbeFailure>,
    pub http_status: Option<u16>,
    pub http_version: Option<String>,
    pub dns_time: Option<f64>,
    pub http_time: f64,
    pub cert_validity_days: Option<i64>,
}

impl ProbeResult {
    pub fn status_label(&self) -> &'static str {
        if self.reachable { RUNNING } else { NOT_RESPONDING }
    }
}
