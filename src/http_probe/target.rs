use url::Url;

/// One endpoint to probe and where its result goes in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Name printed in the report, e.g. `Prometheus`.
    pub name: String,
    pub url: Url,
    /// Report section title, without the `===` decoration.
    pub section: String,
    /// Copy the response body into the report when the target responds.
    pub capture_body: bool,
    /// Status codes counted as reachable. Any 2xx when `None`.
    pub accepted_status_codes: Option<Vec<u16>>,
}

impl Target {
    pub fn new(name: impl Into<String>, url: Url, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url,
            section: section.into(),
            capture_body: false,
            accepted_status_codes: None,
        }
    }

    pub fn capture_body(mut self, capture: bool) -> Self {
        self.capture_body = capture;
        self
    }

    pub fn accepted_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.accepted_status_codes = Some(codes);
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        match &self.accepted_status_codes {
            Some(codes) => codes.contains(&status),
            None => (200..300).contains(&status),
        }
    }
}
