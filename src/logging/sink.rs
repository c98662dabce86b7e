// ABOUTME: Append-only destinations for execution log records
// ABOUTME: Provides in-memory, JSON-lines file and discarding sinks

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::record::LogRecord;
use super::{LogError, Result};

/// Append-only record destination; must tolerate concurrent appends.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, record: &LogRecord) -> Result<()>;
}

/// Keeps records in process, in append order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.lock().await.clone()
    }

    /// Records of one run, in append order
    pub async fn records_for_run(&self, run_id: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.run_id == run_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // one writer at a time so lines never interleave
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every record in the file
    pub async fn read_all(&self) -> Result<Vec<LogRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LogError::Io(e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(LogError::Json))
            .collect()
    }
}

#[async_trait]
impl LogSink for JsonLinesSink {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl LogSink for NullSink {
    async fn append(&self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Status;
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(run_id: &str, task_id: Option<&str>) -> LogRecord {
        LogRecord {
            timestamp: Utc::now(),
            workflow_id: "w1".to_string(),
            run_id: run_id.to_string(),
            task_id: task_id.map(str::to_string),
            status: Status::Success,
            detail: "ok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_order() {
        let sink = MemorySink::new();
        sink.append(&record("a", Some("t1"))).await.unwrap();
        sink.append(&record("b", Some("t1"))).await.unwrap();
        sink.append(&record("a", None)).await.unwrap();

        let run_a = sink.records_for_run("a").await;
        assert_eq!(run_a.len(), 2);
        assert!(run_a[1].is_summary());
        assert_eq!(sink.records().await.len(), 3);
    }

    #[tokio::test]
    async fn test_json_lines_concurrent_appends() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(JsonLinesSink::new(dir.path().join("logs/execution.jsonl")));

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    sink.append(&record(&format!("run-{}", i), Some("t1")))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let records = sink.read_all().await.unwrap();
        assert_eq!(records.len(), 20);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let sink = JsonLinesSink::new(dir.path().join("absent.jsonl"));
        assert!(sink.read_all().await.unwrap().is_empty());
    }
}
