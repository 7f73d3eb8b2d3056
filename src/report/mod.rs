pub mod writer;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::http_probe::result::ProbeResult;

pub const UNABLE_TO_RETRIEVE: &str = "Unable to retrieve";

/// A titled block of report lines, rendered as `=== TITLE ===`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
    not_responding: usize,
}

impl Section {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
            not_responding: 0,
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// `Name: RUNNING` followed by the captured body, or
    /// `Name: NOT RESPONDING` with nothing after it.
    pub fn push_probe(&mut self, result: &ProbeResult) -> &mut Self {
        self.lines
            .push(format!("{}: {}", result.target_name, result.status_label()));

        if !result.reachable {
            self.not_responding += 1;
            return self;
        }

        match &result.body {
            Some(body) => {
                let body = body.strip_suffix('\n').unwrap_or(body);
                if !body.is_empty() {
                    self.lines.push(body.to_string());
                }
            }
            None if result.capture_body => {
                self.lines
                    .push(format!("{} status: {UNABLE_TO_RETRIEVE}", result.target_name));
            }
            None => {}
        }
        self
    }
}

/// Everything one run appends to the report file.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            sections: Vec::new(),
        }
    }

    /// Returns the section with this title, appending it if it is new.
    pub fn section(&mut self, title: &str) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.title == title) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(title));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn not_responding(&self) -> usize {
        self.sections.iter().map(|s| s.not_responding).sum()
    }

    pub fn all_reachable(&self) -> bool {
        self.not_responding() == 0
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Health check report generated at {}\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        for section in &self.sections {
            out.push('\n');
            out.push_str(&format!("=== {} ===\n", section.title));
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
        out
    }
}
