use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// An append-only text file. The file is opened for each write and closed
/// straight after, so several processes can share it.
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `text` as-is; callers supply the trailing newlines.
    pub async fn append(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }
}

/// `19/10/2026-08:05:00`
pub fn heartbeat_timestamp(now: DateTime<Local>) -> String {
    now.format("%d/%m/%Y-%H:%M:%S").to_string()
}

/// `2026-10-19 08:05:00`
pub fn report_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `2026-10-19 08:05:00.123456`
pub fn precise_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}
