use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("DNS resolver setup failed: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("Invalid DNS host '{host}': {source}")]
    DnsHost {
        host: String,
        source: std::net::AddrParseError,
    },

    #[error("Invalid target URL '{url}': {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CheckError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckError>;
