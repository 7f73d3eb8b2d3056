use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use unicode_truncate::{Alignment, UnicodeTruncateStr};

use stackcheck::config::app_config::{AppConfig, setup_resolver, setup_tls_connector};
use stackcheck::config::cli::CliArgs;
use stackcheck::http_probe::prelude::*;
use stackcheck::report::writer::ReportWriter;
use stackcheck::{CheckError, HealthCheck, Result, logger};

const STRICT_FAILURE_EXIT: u8 = 2;

fn display_width(input: &str) -> usize {
    input.unicode_truncate(usize::MAX).1
}

fn to_fixed_width(input: &str, width: usize) -> String {
    input.unicode_pad(width, Alignment::Left, true).into_owned()
}

fn print_summary(result: &ProbeResult, width: usize) {
    let name = to_fixed_width(&result.target_name, width);
    match result.failure {
        None => println!(
            "[{name}] ✅ URL: {}, Status: {:?}, DNS: {}, Elapsed: {:.2}ms, Cert: {}",
            result.url,
            result.http_status,
            result
                .dns_time
                .map(|t| format!("{:.2}ms", t * 1000.0))
                .unwrap_or_else(|| "N/A".to_string()),
            result.http_time * 1000.0,
            result
                .cert_validity_days
                .map(|d| format!("{d}d"))
                .unwrap_or_else(|| "N/A".to_string())
        ),
        Some(failure) => println!("[{name}] ❌ {}: {failure}", result.url),
    }
}

fn unexpected_dotenv_error<T>(result: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

async fn run(cli: CliArgs) -> Result<ExitCode> {
    let config = AppConfig::resolve(cli)?;

    let mut prober = Prober::new(config.timeout)?.with_tls_connector(setup_tls_connector()?);
    match setup_resolver(&config.dns_hosts, config.timeout) {
        Ok(resolver) => prober = prober.with_resolver(resolver),
        Err(e @ CheckError::DnsHost { .. }) => return Err(e),
        Err(e) => tracing::warn!("DNS timing disabled: {e}"),
    }
    let check = HealthCheck::new(prober, config.targets()?);

    let width = check
        .targets()
        .iter()
        .map(|t| display_width(&t.name))
        .max()
        .unwrap_or(10);

    let results = check.run().await;
    for result in &results {
        print_summary(result, width);
    }

    let report = check.report(&results, Utc::now());
    let mut writer = ReportWriter::open(&config.report_path)?;
    writer.write(&report)?;
    tracing::info!(path = %writer.path().display(), "report written");
    println!("Report appended to {}", writer.path().display());

    if config.strict && !report.all_reachable() {
        tracing::warn!(
            not_responding = report.not_responding(),
            "strict mode: some targets are not responding"
        );
        return Ok(ExitCode::from(STRICT_FAILURE_EXIT));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is normal; a malformed one is worth a warning.
    let dotenv_error = unexpected_dotenv_error(dotenvy::dotenv());

    let cli = CliArgs::parse();
    logger::init_cli_logger(cli.verbose);
    if let Some(e) = dotenv_error {
        tracing::warn!("ignoring .env file: {e}");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("health check failed: {e}");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}
