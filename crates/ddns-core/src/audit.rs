// # Audit Log
//
// Append-only record of every update attempt.
//
// ## File Format
//
// One line per attempt, local time at minute resolution:
//
// ```text
// 2025-01-09T12:00 A: home.example.com updated to: 203.0.113.5
// 2025-01-09T12:00 AAAA: example.com update failed
// ```
//
// The file is opened in append mode for each line and closed again before
// returning. It is never truncated or rotated.

use chrono::{DateTime, Local, TimeZone};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::config::RecordType;
use crate::error::{Error, Result};

/// Timestamp format of audit lines
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Result of one update attempt, consumed by [`AuditLog::record`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Provider-reported success
    pub success: bool,
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub record_name: String,
    /// The IP the record was set to
    pub new_ip: String,
}

impl UpdateOutcome {
    /// Render the audit line (without trailing newline)
    pub fn log_line<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let timestamp = at.format(TIMESTAMP_FORMAT);
        if self.success {
            format!(
                "{} {}: {} updated to: {}",
                timestamp, self.record_type, self.record_name, self.new_ip
            )
        } else {
            format!(
                "{} {}: {} update failed",
                timestamp, self.record_type, self.record_name
            )
        }
    }
}

/// Append-only audit log file
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    /// Create an audit log writing to `path`
    ///
    /// Nothing is opened until the first [`record`](Self::record).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append one line for an update attempt
    pub async fn record(&self, outcome: &UpdateOutcome) -> Result<()> {
        let line = outcome.log_line(&Local::now());
        self.append(&line).await
    }

    async fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                Error::audit(format!(
                    "Failed to open audit log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| {
                Error::audit(format!(
                    "Failed to write audit log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.flush().await.map_err(|e| {
            Error::audit(format!(
                "Failed to flush audit log {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Audit line appended to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn outcome(success: bool) -> UpdateOutcome {
        UpdateOutcome {
            success,
            record_type: RecordType::A,
            record_name: "home.example.com".to_string(),
            new_ip: "203.0.113.5".to_string(),
        }
    }

    #[test]
    fn test_success_line_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 9, 12, 34, 56).unwrap();
        assert_eq!(
            outcome(true).log_line(&at),
            "2025-01-09T12:34 A: home.example.com updated to: 203.0.113.5"
        );
    }

    #[test]
    fn test_failure_line_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 9, 7, 5, 0).unwrap();
        let mut failed = outcome(false);
        failed.record_type = RecordType::Aaaa;
        assert_eq!(
            failed.log_line(&at),
            "2025-01-09T07:05 AAAA: home.example.com update failed"
        );
    }

    #[tokio::test]
    async fn test_record_appends_without_truncating() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ddns.log");
        std::fs::write(&path, "existing line\n").unwrap();

        let log = AuditLog::new(&path);
        log.record(&outcome(true)).await.unwrap();
        log.record(&outcome(false)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].ends_with(" A: home.example.com updated to: 203.0.113.5"));
        assert!(lines[2].ends_with(" A: home.example.com update failed"));
    }

    #[tokio::test]
    async fn test_record_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.log");

        AuditLog::new(&path).record(&outcome(true)).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_audit_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("ddns.log");

        let err = AuditLog::new(&path).record(&outcome(true)).await.unwrap_err();
        assert!(matches!(err, Error::Audit(_)));
    }
}
