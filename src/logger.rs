use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

const RUN_PREFIX: &str = "render-";
const RUN_SUFFIX: &str = ".jsonl";

static RUN_SEQUENCE: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub documents: usize,
    pub nodes: usize,
    pub failures: usize,
}

/// Closing line of a run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub finished_at: String,
    pub warnings: usize,
    pub errors: usize,
    #[serde(flatten)]
    pub stats: RenderStats,
}

/// One line of `render-<run_id>.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLine {
    Record(LogRecord),
    Summary(RunSummary),
}

/// Per-run JSONL log: one record per document event, a summary line at the
/// end. Every run gets its own file; runs never share or truncate one.
#[derive(Clone)]
pub struct RunLog {
    path: PathBuf,
    run_id: String,
    writer: Arc<Mutex<BufWriter<File>>>,
    warnings: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl RunLog {
    pub fn open(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

        let run_id = format!(
            "{}-{}-{}",
            Utc::now().format("%Y%m%dT%H%M%S%3f"),
            std::process::id(),
            RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        );
        let path = log_dir.join(format!("{}{}{}", RUN_PREFIX, run_id, RUN_SUFFIX));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("Failed to create run log: {:?}", path))?;

        Ok(RunLog {
            path,
            run_id,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
            warnings: Arc::new(AtomicUsize::new(0)),
            errors: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn write_line(&self, line: &LogLine) {
        // Poisoned writer: the line is dropped, the run carries on.
        if let (Ok(mut writer), Ok(json)) = (self.writer.lock(), serde_json::to_string(line)) {
            let _ = writeln!(writer, "{}", json);
        }
    }

    pub fn record(&self, severity: Severity, document: Option<&str>, message: String) {
        match severity {
            Severity::Warning => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Info => {}
        }

        self.write_line(&LogLine::Record(LogRecord {
            timestamp: now(),
            severity,
            document: document.map(str::to_string),
            message,
        }));
    }

    pub fn info(&self, document: &str, message: String) {
        self.record(Severity::Info, Some(document), message);
    }

    pub fn warn(&self, document: &str, message: String) {
        self.record(Severity::Warning, Some(document), message);
    }

    pub fn error(&self, document: &str, message: String) {
        self.record(Severity::Error, Some(document), message);
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Appends the summary line and flushes.
    pub fn finish(&self, stats: RenderStats) -> Result<RunSummary> {
        let summary = RunSummary {
            run_id: self.run_id.clone(),
            finished_at: now(),
            warnings: self.warnings(),
            errors: self.errors(),
            stats,
        };
        self.write_line(&LogLine::Summary(summary.clone()));

        if let Ok(mut writer) = self.writer.lock() {
            writer
                .flush()
                .with_context(|| format!("Failed to flush run log: {:?}", self.path))?;
        }
        Ok(summary)
    }

    /// Deletes the oldest run logs in the log directory so at most
    /// `max_runs` remain. This run's own log is never deleted.
    pub fn prune(&self, max_runs: usize) -> Result<usize> {
        let log_dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut older: Vec<(PathBuf, DateTime<Utc>)> = WalkDir::new(log_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.path() != self.path.as_path())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|n| n.starts_with(RUN_PREFIX) && n.ends_with(RUN_SUFFIX))
            })
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok()?;
                Some((e.into_path(), modified.into()))
            })
            .collect();

        let keep = max_runs.saturating_sub(1);
        if older.len() <= keep {
            return Ok(0);
        }

        older.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        let excess = older.len() - keep;
        for (path, _) in older.iter().take(excess) {
            fs::remove_file(path)
                .with_context(|| format!("Failed to delete old run log: {:?}", path))?;
        }
        Ok(excess)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_lines(log: &RunLog) -> Vec<LogLine> {
        fs::read_to_string(log.path())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_open_creates_run_file() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::open(&temp_dir.path().join("logs")).unwrap();
        assert!(log.path().exists());
        assert!(log
            .path()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .contains(&log.run_id));
    }

    #[test]
    fn test_runs_in_same_instant_get_separate_files() {
        let temp_dir = TempDir::new().unwrap();
        let first = RunLog::open(temp_dir.path()).unwrap();
        let second = RunLog::open(temp_dir.path()).unwrap();

        assert_ne!(first.run_id, second.run_id);
        first.error("a", "first".to_string());
        first.finish(RenderStats::default()).unwrap();
        second.finish(RenderStats::default()).unwrap();

        assert_eq!(read_lines(&first).len(), 2);
        assert_eq!(read_lines(&second).len(), 1);
    }

    #[test]
    fn test_counts_by_severity() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::open(temp_dir.path()).unwrap();
        let shared = log.clone();

        log.info("index", "rendered".to_string());
        shared.warn("index", "empty list".to_string());
        shared.error("about", "invalid tag name".to_string());

        assert_eq!(log.warnings(), 1);
        assert_eq!(log.errors(), 1);
    }

    #[test]
    fn test_summary_closes_the_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::open(temp_dir.path()).unwrap();
        log.error("bad", "Invalid entity".to_string());

        let stats = RenderStats {
            documents: 3,
            nodes: 42,
            failures: 1,
        };
        let summary = log.finish(stats.clone()).unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.stats, stats);

        let lines = read_lines(&log);
        assert_eq!(lines.len(), 2);
        match &lines[0] {
            LogLine::Record(record) => {
                assert_eq!(record.severity, Severity::Error);
                assert_eq!(record.document.as_deref(), Some("bad"));
            }
            other => panic!("expected a record, got {:?}", other),
        }
        assert_eq!(lines[1], LogLine::Summary(summary));
    }

    #[test]
    fn test_prune_keeps_newest_runs_and_own_log() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..15 {
            File::create(temp_dir.path().join(format!("render-old{:02}.jsonl", i))).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        File::create(temp_dir.path().join("notes.txt")).unwrap();

        let log = RunLog::open(temp_dir.path()).unwrap();
        let removed = log.prune(2).unwrap();
        assert_eq!(removed, 14);

        let mut remaining: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("render-"))
            .collect();
        remaining.sort();

        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&"render-old14.jsonl".to_string()));
        assert!(log.path().exists());
        assert!(temp_dir.path().join("notes.txt").exists());
    }
}
