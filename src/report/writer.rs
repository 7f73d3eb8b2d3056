use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::Report;
use crate::error::Result;

/// Append-only handle on the report file, opened once per run.
pub struct ReportWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl ReportWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&mut self, report: &Report) -> Result<()> {
        self.file.write_all(report.render().as_bytes())?;
        self.file.flush()?;
        tracing::debug!(path = %self.path.display(), "report appended");
        Ok(())
    }
}
