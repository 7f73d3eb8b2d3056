use chrono::{DateTime, Utc};

use crate::http_probe::prelude::*;
use crate::report::Report;

pub const SYSTEM_SECTION: &str = "SYSTEM STATUS";

/// Runs every target once, in order, and turns the results into a report.
pub struct HealthCheck {
    prober: Prober,
    targets: Vec<Target>,
}

impl HealthCheck {
    pub fn new(prober: Prober, targets: Vec<Target>) -> Self {
        Self { prober, targets }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Probes sequentially; each probe finishes or times out before the next
    /// one starts. Results come back in target order.
    pub async fn run(&self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            tracing::debug!(
                name = %target.name,
                url = %target.url,
                timeout_ms = self.prober.timeout().as_millis() as u64,
                "probing"
            );
            let result = self.prober.probe(target).await;
            match result.failure {
                Some(failure) => {
                    tracing::warn!(name = %target.name, url = %target.url, %failure, "not responding")
                }
                None => tracing::info!(
                    name = %target.name,
                    status = ?result.http_status,
                    dns_ms = ?result.dns_time.map(|t| t * 1000.0),
                    elapsed_ms = result.http_time * 1000.0,
                    "running"
                ),
            }
            results.push(result);
        }
        results
    }

    /// One section per distinct target section, then a system section
    /// listing every endpoint URL that was checked.
    pub fn report(&self, results: &[ProbeResult], generated_at: DateTime<Utc>) -> Report {
        let mut report = Report::new(generated_at);

        for (target, result) in self.targets.iter().zip(results) {
            report.section(&target.section).push_probe(result);
        }

        let responding = results.iter().filter(|r| r.reachable).count();
        let system = report.section(SYSTEM_SECTION);
        for target in &self.targets {
            system.push_line(format!("{} endpoint: {}", target.name, target.url));
        }
        system.push_line(format!(
            "Targets responding: {responding}/{}",
            results.len()
        ));

        report
    }
}
