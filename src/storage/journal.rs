//! Append-only attempt journal
//!
//! One line per attempt:
//!
//! ```text
//! 2026-10-18T13:20:01.123+00:00 | -- | K6GLNG7QWERT | Invalid coupon code
//! 2026-10-18T13:20:02.871+00:00 | OK | K6GLNG7ABCDE | Coupon applied successfully
//! ```
//!
//! The file is never rotated or pruned. Reads take the tail only and do not
//! lock against the writer.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Lines returned by the log-tail endpoint
pub const TAIL_LINES: usize = 50;

/// One redemption attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    pub code: String,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(code: impl Into<String>, success: bool, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            success,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Render as a single journal line, without the trailing newline
    pub fn to_line(&self) -> String {
        let message: String = self
            .message
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        format!(
            "{} | {} | {} | {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            if self.success { "OK" } else { "--" },
            self.code,
            message
        )
    }
}

/// Journal errors
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("Failed to create journal directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Journal I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only text log of attempts
#[derive(Debug)]
pub struct AttemptJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AttemptJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> JournalError {
        JournalError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Append one record
    pub async fn append(&self, record: &AttemptRecord) -> Result<(), JournalError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| JournalError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        let mut line = record.to_line();
        line.push('\n');
        file.write_all(line.as_bytes()).await.map_err(|e| self.io_err(e))?;
        file.flush().await.map_err(|e| self.io_err(e))?;

        Ok(())
    }

    /// Last `n` lines, oldest first
    ///
    /// A journal that does not exist yet reads as empty.
    pub async fn tail(&self, n: usize) -> Result<Vec<String>, JournalError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }
}
