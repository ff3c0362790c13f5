// src/record.rs
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::session::{SessionListener, SessionSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub pose: String,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub longest_hold_seconds: u64,
    pub frames_evaluated: u64,
    pub frames_skipped: u64,
}

impl From<&SessionSummary> for SessionRecord {
    fn from(summary: &SessionSummary) -> Self {
        Self {
            session_id: summary.id.to_string(),
            pose: summary.pose_id.clone(),
            started_at: summary.started_at.to_rfc3339(),
            ended_at: summary.ended_at.to_rfc3339(),
            duration_ms: summary.duration_ms,
            longest_hold_seconds: summary.longest_hold_seconds,
            frames_evaluated: summary.frames_evaluated,
            frames_skipped: summary.frames_skipped,
        }
    }
}

/// Appends one row per finished session to `<output_dir>/sessions.csv`.
pub struct CsvSessionLog {
    output_dir: PathBuf,
}

impl CsvSessionLog {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.output_dir.join("sessions.csv")
    }

    pub fn append(&self, summary: &SessionSummary) -> Result<PathBuf> {
        let csv_path = self.path();
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating {}", self.output_dir.display()))?;

        let is_new = !csv_path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&csv_path)
            .with_context(|| format!("opening {}", csv_path.display()))?;

        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer.serialize(SessionRecord::from(summary))?;
        writer.flush()?;
        Ok(csv_path)
    }

    pub fn read_all(&self) -> Result<Vec<SessionRecord>> {
        let csv_path = self.path();
        if !csv_path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&csv_path)?;
        let mut records = Vec::new();
        for record in reader.deserialize::<SessionRecord>() {
            records.push(record?);
        }
        Ok(records)
    }
}

impl SessionListener for CsvSessionLog {
    fn session_finished(&mut self, summary: &SessionSummary) -> Result<()> {
        let path = self.append(summary)?;
        tracing::info!(path = %path.display(), session = %summary.id, "session recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn summary(pose: &str, longest: u64) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            pose_id: pose.to_string(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            duration_ms: 42_000,
            longest_hold_seconds: longest,
            frames_evaluated: 1200,
            frames_skipped: 30,
        }
    }

    #[test]
    fn test_appends_rows_with_single_header() {
        let dir = std::env::temp_dir().join(format!("asana_tracker_{}", Uuid::new_v4()));
        let mut log = CsvSessionLog::new(&dir);

        let first = summary("trikonasana", 12);
        log.session_finished(&first).unwrap();
        log.session_finished(&summary("virabhadrasana", 30)).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SessionRecord::from(&first));
        assert_eq!(records[1].pose, "virabhadrasana");
        assert_eq!(records[1].longest_hold_seconds, 30);

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("session_id").count(), 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = std::env::temp_dir().join(format!("asana_tracker_{}", Uuid::new_v4()));
        assert!(CsvSessionLog::new(&dir).read_all().unwrap().is_empty());
    }
}
