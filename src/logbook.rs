//! Per-category append-only log files.
//!
//! Operators of the previous worker grep these files after a run, so the
//! format is kept dumb on purpose: one `[timestamp] message` line per event,
//! one file per category (resource names plus `foreign_keys`). No rotation,
//! no size cap. Structured diagnostics go through `tracing` instead.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;

/// Writes timestamped lines to `{dir}/{category}.log`, creating the directory
/// on first use.
#[derive(Debug, Clone)]
pub struct Logbook {
    dir: PathBuf,
}

impl Logbook {
    /// Create a logbook rooted at `dir`. Nothing is created until the first
    /// append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Append a line to the category's log file.
    ///
    /// A failed write must never abort an import, so IO errors degrade to a
    /// `tracing` warning.
    pub fn append(&self, category: &str, message: &str) {
        if let Err(err) = self.try_append(category, message) {
            tracing::warn!(category, %err, "failed to append to log file");
        }
    }

    fn try_append(&self, category: &str, message: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(format!("{category}.log")))?;
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), message);
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_timestamped_lines_per_category() {
        let dir = tempfile::tempdir().unwrap();
        let logbook = Logbook::new(dir.path().join("logs"));

        logbook.append("startups", "skipping startups 1 (Acme): already imported");
        logbook.append("startups", "created startups 2 (Beta)");
        logbook.append("foreign_keys", "built mapping for startups (2 entries)");

        let startups = fs::read_to_string(dir.path().join("logs/startups.log")).unwrap();
        let lines: Vec<&str> = startups.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("skipping startups 1 (Acme): already imported"));
        assert!(lines[1].contains("created startups 2"));

        let fk = fs::read_to_string(dir.path().join("logs/foreign_keys.log")).unwrap();
        assert!(fk.contains("built mapping for startups"));
    }

    #[test]
    fn append_is_cumulative_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        Logbook::new(dir.path()).append("events", "first");
        Logbook::new(dir.path()).append("events", "second");

        let content = fs::read_to_string(dir.path().join("events.log")).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
