pub mod check;
pub mod config;
pub mod error;
pub mod http_probe;
pub mod logger;
pub mod report;

pub use check::HealthCheck;
pub use config::app_config::AppConfig;
pub use error::{CheckError, Result};
