use std::net::TcpListener;
use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use stackcheck::config::app_config::Endpoint;
use stackcheck::http_probe::prelude::*;
use stackcheck::report::writer::ReportWriter;
use stackcheck::{AppConfig, HealthCheck};
use tempfile::TempDir;
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{
    NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts,
};

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn local_config(app_port: u16, prometheus_port: u16, grafana_port: u16) -> AppConfig {
    let mut config = AppConfig::new("127.0.0.1", "127.0.0.1");
    config.application = Endpoint::new(app_port, "/status");
    config.prometheus = Endpoint::new(prometheus_port, "/");
    config.grafana = Endpoint::new(grafana_port, "/");
    config
}

fn health_check(config: &AppConfig, timeout: Duration) -> HealthCheck {
    let prober = Prober::new(timeout).unwrap();
    HealthCheck::new(prober, config.targets().unwrap())
}

#[tokio::test]
async fn test_all_targets_running() {
    let app = MockServer::start_async().await;
    let prometheus = MockServer::start_async().await;
    let grafana = MockServer::start_async().await;

    let app_mock = app
        .mock_async(|when, then| {
            when.method(GET).path("/status");
            then.status(200)
                .header("Content-Type", "application/json")
                .body(r#"{"status":"healthy"}"#);
        })
        .await;
    let prometheus_mock = prometheus
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("Prometheus Time Series Collection and Processing Server");
        })
        .await;
    let grafana_mock = grafana
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("<html>Grafana</html>");
        })
        .await;

    let config = local_config(app.port(), prometheus.port(), grafana.port());
    let check = health_check(&config, Duration::from_secs(5));
    assert_eq!(check.targets().len(), 3);

    let results = check.run().await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.reachable));
    assert_eq!(results[0].body.as_deref(), Some(r#"{"status":"healthy"}"#));
    // only the application endpoint captures its body
    assert!(results[1].body.is_none());

    app_mock.assert_async().await;
    prometheus_mock.assert_async().await;
    grafana_mock.assert_async().await;

    let report = check.report(&results, Utc::now());
    assert!(report.all_reachable());

    let rendered = report.render();
    assert!(rendered.contains("=== APPLICATION STATUS ===\nApplication: RUNNING\n{\"status\":\"healthy\"}\n"));
    assert!(rendered.contains("=== MONITORING STATUS ===\nPrometheus: RUNNING\nGrafana: RUNNING\n"));
    assert!(rendered.contains("=== SYSTEM STATUS ==="));
    assert!(rendered.contains(&format!(
        "Application endpoint: http://127.0.0.1:{}/status",
        app.port()
    )));
    assert!(rendered.contains("Targets responding: 3/3"));
    assert!(!rendered.contains('$'));
}

#[tokio::test]
async fn test_application_connection_refused() {
    let prometheus = MockServer::start_async().await;
    let grafana = MockServer::start_async().await;
    prometheus
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    grafana
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;

    let config = local_config(closed_port(), prometheus.port(), grafana.port());
    let check = health_check(&config, Duration::from_secs(5));

    let results = check.run().await;
    assert!(!results[0].reachable);
    assert_eq!(results[0].failure, Some(ProbeFailure::Connect));
    assert!(results[0].body.is_none());

    let report = check.report(&results, Utc::now());
    assert!(!report.all_reachable());
    assert_eq!(report.not_responding(), 1);

    let rendered = report.render();
    assert!(rendered.contains("=== APPLICATION STATUS ===\nApplication: NOT RESPONDING\n\n"));
    assert!(!rendered.contains("Unable to retrieve"));
    assert!(rendered.contains("Prometheus: RUNNING"));
}

#[tokio::test]
async fn test_grafana_timeout() {
    let app = MockServer::start_async().await;
    let prometheus = MockServer::start_async().await;
    let grafana = MockServer::start_async().await;
    app.mock_async(|when, then| {
        when.method(GET).path("/status");
        then.status(200).body(r#"{"status":"healthy"}"#);
    })
    .await;
    prometheus
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;
    grafana
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).delay(Duration::from_secs(3));
        })
        .await;

    let config = local_config(app.port(), prometheus.port(), grafana.port());
    let check = health_check(&config, Duration::from_millis(300));

    let results = check.run().await;
    assert!(results[0].reachable);
    assert!(results[1].reachable);
    assert!(!results[2].reachable);
    assert_eq!(results[2].failure, Some(ProbeFailure::Timeout));

    let rendered = check.report(&results, Utc::now()).render();
    assert!(rendered.contains("Prometheus: RUNNING"));
    assert!(rendered.contains("Grafana: NOT RESPONDING"));
    assert!(rendered.contains("Targets responding: 2/3"));
}

#[tokio::test]
async fn test_server_error_is_not_responding() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(503).body("unavailable");
        })
        .await;

    let url = url::Url::parse(&server.url("/")).unwrap();
    let target = Target::new("Prometheus", url, "MONITORING STATUS");
    let prober = Prober::new(Duration::from_secs(5)).unwrap();

    let result = prober.probe(&target).await;
    assert!(!result.reachable);
    assert_eq!(result.http_status, Some(503));
    assert_eq!(result.failure, Some(ProbeFailure::Status(503)));
    assert_eq!(result.status_label(), "NOT RESPONDING");
}

#[tokio::test]
async fn test_accepted_status_codes_override_success_range() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(401);
        })
        .await;

    let url = url::Url::parse(&server.url("/login")).unwrap();
    let target = Target::new("Grafana login", url, "MONITORING STATUS")
        .accepted_status_codes(vec![200, 401]);
    let prober = Prober::new(Duration::from_secs(5)).unwrap();

    let result = prober.probe(&target).await;
    assert!(result.reachable);
    assert!(result.failure.is_none());
    assert_eq!(result.http_version.as_deref(), Some("HTTP/1.1"));
}

#[tokio::test]
async fn test_report_file_accumulates_runs() {
    let temp_dir = TempDir::new().unwrap();
    let report_path = temp_dir.path().join("health_check_report.txt");

    let app = MockServer::start_async().await;
    app.mock_async(|when, then| {
        when.method(GET).path("/status");
        then.status(200).body(r#"{"status":"healthy"}"#);
    })
    .await;
    let monitoring_port = closed_port();

    let mut config = local_config(app.port(), monitoring_port, monitoring_port);
    config.report_path = report_path.clone();
    let check = health_check(&config, Duration::from_secs(2));

    for _ in 0..2 {
        let results = check.run().await;
        let report = check.report(&results, Utc::now());
        let mut writer = ReportWriter::open(&config.report_path).unwrap();
        writer.write(&report).unwrap();
    }

    let content = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(content.matches("Application: RUNNING").count(), 2);
    assert_eq!(content.matches("Prometheus: NOT RESPONDING").count(), 2);
    assert_eq!(content.matches("Grafana: NOT RESPONDING").count(), 2);
    assert_eq!(content.matches("Health check report generated at").count(), 2);
}

/// A name server that accepts TCP connections and never answers.
async fn silent_name_server() -> TokioAsyncResolver {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let mut name_servers = NameServerConfigGroup::new();
    name_servers.push(NameServerConfig {
        socket_addr: addr,
        protocol: Protocol::Tcp,
        tls_dns_name: None,
        trust_negative_responses: false,
        bind_addr: None,
    });
    TokioAsyncResolver::tokio(
        ResolverConfig::from_parts(None, vec![], name_servers),
        ResolverOpts::default(),
    )
}

#[tokio::test]
async fn test_stalled_name_server_does_not_outlast_timeout() {
    let resolver = silent_name_server().await;
    let prober = Prober::new(Duration::from_millis(300))
        .unwrap()
        .with_resolver(resolver);
    assert_eq!(prober.timeout(), Duration::from_millis(300));

    let url = url::Url::parse("http://grafana.monitoring.internal.example.com:3000/").unwrap();
    let target = Target::new("Grafana", url, "MONITORING STATUS");

    let start = std::time::Instant::now();
    let result = prober.probe(&target).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_secs(2),
        "check with a 300ms timeout took {elapsed:?}"
    );
    assert!(result.dns_time.is_none());
}

#[tokio::test]
async fn test_resolver_records_dns_time() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        })
        .await;

    // localhost is answered by the resolver itself, never by the name server
    let resolver = silent_name_server().await;
    let prober = Prober::new(Duration::from_secs(5))
        .unwrap()
        .with_resolver(resolver);

    let url = url::Url::parse(&format!("http://localhost:{}/", server.port())).unwrap();
    let result = prober
        .probe(&Target::new("Prometheus", url, "MONITORING STATUS"))
        .await;

    assert!(result.reachable);
    let dns_time = result.dns_time.expect("dns time recorded");
    assert!(dns_time >= 0.0 && dns_time < 5.0);
}

#[tokio::test]
async fn test_redirect_status_is_not_followed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(301).header("Location", "/login");
        })
        .await;
    let login = server
        .mock_async(|when, then| {
            when.method(GET).path("/login");
            then.status(200);
        })
        .await;

    let url = url::Url::parse(&server.url("/")).unwrap();
    let prober = Prober::new(Duration::from_secs(5)).unwrap();

    let default_codes = Target::new("Grafana", url.clone(), "MONITORING STATUS");
    let result = prober.probe(&default_codes).await;
    assert!(!result.reachable);
    assert_eq!(result.failure, Some(ProbeFailure::Status(301)));

    let with_redirect = Target::new("Grafana", url, "MONITORING STATUS")
        .accepted_status_codes(vec![200, 301]);
    let result = prober.probe(&with_redirect).await;
    assert!(result.reachable);
    assert_eq!(result.http_status, Some(301));

    login.assert_hits_async(0).await;
}
