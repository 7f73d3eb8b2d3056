use std::net::SocketAddr;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use reqwest::redirect::Policy;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tokio_native_tls::TlsConnector as TokioTlsConnector;
use trust_dns_resolver::TokioAsyncResolver;
use url::{Host, Url};
use x509_parser::parse_x509_certificate;

use super::prelude::*;
use super::report;
use crate::error::Result;

const USER_AGENT: &str = concat!("stackcheck/", env!("CARGO_PKG_VERSION"));

async fn measure_dns_time(host: &str, resolver: &TokioAsyncResolver) -> Option<f64> {
    let start = Instant::now();
    resolver.lookup_ip(host).await.ok()?;
    Some(start.elapsed().as_secs_f64())
}

async fn resolve_socket_addr(
    url: &Url,
    resolver: Option<&TokioAsyncResolver>,
) -> Option<SocketAddr> {
    let port = url.port_or_known_default()?;
    match url.host()? {
        Host::Ipv4(ip) => Some(SocketAddr::new(ip.into(), port)),
        Host::Ipv6(ip) => Some(SocketAddr::new(ip.into(), port)),
        Host::Domain(domain) => match resolver {
            Some(resolver) => {
                let ip = resolver.lookup_ip(domain).await.ok()?.iter().next()?;
                Some(SocketAddr::new(ip, port))
            }
            None => lookup_host((domain, port)).await.ok()?.next(),
        },
    }
}

async fn get_cert_validity_days(
    url: &Url,
    connector: &TokioTlsConnector,
    resolver: Option<&TokioAsyncResolver>,
) -> Option<i64> {
    let host = url.host_str()?.trim_start_matches('[').trim_end_matches(']');
    let socket_addr = resolve_socket_addr(url, resolver).await?;

    let stream = tokio::net::TcpStream::connect(socket_addr).await.ok()?;
    let tls_stream = connector.connect(host, stream).await.ok()?;

    // Extract certificate in blocking context
    let cert_der = tokio::task::spawn_blocking(move || {
        let cert = tls_stream.get_ref().peer_certificate().ok().flatten()?;
        cert.to_der().ok()
    })
    .await
    .ok()??;

    let (_, parsed) = parse_x509_certificate(&cert_der).ok()?;

    let not_after = parsed.validity().not_after.timestamp();
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs() as i64;

    Some((not_after - now) / 86400)
}

fn version_label(version: reqwest::Version) -> String {
    match version {
        reqwest::Version::HTTP_09 => "HTTP/0.9".to_string(),
        reqwest::Version::HTTP_10 => "HTTP/1.0".to_string(),
        reqwest::Version::HTTP_11 => "HTTP/1.1".to_string(),
        reqwest::Version::HTTP_2 => "HTTP/2.0".to_string(),
        reqwest::Version::HTTP_3 => "HTTP/3.0".to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

/// Issues one GET per target with a fixed timeout. No retries, no backoff.
/// Redirects are not followed, so a 3xx is the status that gets classified.
///
/// DNS timing and certificate expiry are measured only when a resolver or
/// TLS connector is attached; neither affects whether a target is reachable.
pub struct Prober {
    client: Client,
    timeout: Duration,
    resolver: Option<TokioAsyncResolver>,
    tls_connector: Option<TokioTlsConnector>,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .redirect(Policy::none())
            .no_proxy()
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            timeout,
            resolver: None,
            tls_connector: None,
        })
    }

    pub fn with_resolver(mut self, resolver: TokioAsyncResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_tls_connector(mut self, connector: TokioTlsConnector) -> Self {
        self.tls_connector = Some(connector);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn probe(&self, target: &Target) -> ProbeResult {
        let url = &target.url;

        // A stalled name server must not hold the probe past its timeout.
        let dns_time = match (&self.resolver, url.host()) {
            (Some(resolver), Some(Host::Domain(domain))) => {
                timeout(self.timeout, measure_dns_time(domain, resolver))
                    .await
                    .ok()
                    .flatten()
            }
            _ => None,
        };

        let mut result = ProbeResult {
            target_name: target.name.clone(),
            url: url.to_string(),
            reachable: false,
            body: None,
            capture_body: target.capture_body,
            failure: None,
            http_status: None,
            http_version: None,
            dns_time,
            http_time: 0.0,
            cert_validity_days: None,
        };

        let start = Instant::now();
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                result.http_time = start.elapsed().as_secs_f64();
                let failure = ProbeFailure::from_reqwest(&e);
                tracing::debug!(name = %target.name, %url, "probe failed: {}", report(&e));
                result.failure = Some(failure);
                return result;
            }
        };

        let status = response.status().as_u16();
        result.http_status = Some(status);
        result.http_version = Some(version_label(response.version()));
        result.reachable = target.accepts(status);

        if !result.reachable {
            result.failure = Some(ProbeFailure::Status(status));
        } else if target.capture_body {
            match response.text().await {
                Ok(body) => result.body = Some(body),
                Err(e) => {
                    tracing::warn!(name = %target.name, "failed to read response body: {}", report(&e));
                }
            }
        }
        result.http_time = start.elapsed().as_secs_f64();

        if url.scheme() == "https" {
            if let Some(connector) = &self.tls_connector {
                result.cert_validity_days = timeout(
                    self.timeout,
                    get_cert_validity_days(url, connector, self.resolver.as_ref()),
                )
                .await
                .ok()
                .flatten();
            }
        }

        result
    }
}
