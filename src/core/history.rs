//! Test history log
//!
//! The log is an append-only text file with one `engine,propeller,date` line
//! per completed test. [`HistoryWatcher`] re-reads it only after its
//! modification time moves forward.

use derive_more::{Display, Error};
use serde::Serialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

/// One completed bench run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub engine: String,
    pub propeller: String,
    pub date: String,
}

impl TestRecord {
    pub fn new(
        engine: impl Into<String>,
        propeller: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            engine: engine.into(),
            propeller: propeller.into(),
            date: date.into(),
        }
    }

    /// Split a log line into exactly three fields. Fields are taken as-is.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.trim().split(',');
        let record = Self::new(fields.next()?, fields.next()?, fields.next()?);
        if fields.next().is_some() {
            return None;
        }
        Some(record)
    }

    pub fn to_line(&self) -> String {
        format!("{},{},{}", self.engine, self.propeller, self.date)
    }
}

impl std::fmt::Display for TestRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {} | {}", self.engine, self.propeller, self.date)
    }
}

#[derive(Debug, Display, Error)]
pub enum HistoryError {
    #[display("failed to read history log {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("history line {line_number} is malformed: {line:?}")]
    Corrupt { line_number: usize, line: String },
}

/// Outcome of one watcher tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum HistoryPoll {
    /// Log untouched since the last refresh; nothing was read.
    Unchanged,
    /// No log, or a log without records.
    Empty,
    Refreshed(Vec<TestRecord>),
}

/// Parse every record of a log body, failing on the first malformed line.
pub fn parse_history(body: &str) -> Result<Vec<TestRecord>, HistoryError> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            TestRecord::parse_line(line).ok_or_else(|| HistoryError::Corrupt {
                line_number: idx + 1,
                line: line.to_string(),
            })
        })
        .collect()
}

pub struct HistoryWatcher {
    path: PathBuf,
    last_modified_time: Option<SystemTime>,
    refreshes: usize,
}

impl HistoryWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified_time: None,
            refreshes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_modified_time(&self) -> Option<SystemTime> {
        self.last_modified_time
    }

    /// How many times the log body has been read and parsed.
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn poll(&mut self) -> Result<HistoryPoll, HistoryError> {
        let modified = match fs::metadata(&self.path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.last_modified_time = None;
                return Ok(HistoryPoll::Empty);
            }
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if let Some(last) = self.last_modified_time {
            if modified <= last {
                return Ok(HistoryPoll::Unchanged);
            }
        }

        // The file may have grown since `modified` was sampled; the next tick
        // sees the newer timestamp and reads again.
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.last_modified_time = None;
                return Ok(HistoryPoll::Empty);
            }
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        self.refreshes += 1;

        let records = parse_history(&body)?;
        self.last_modified_time = Some(modified);
        log::debug!(
            "history log {} refreshed: {} records",
            self.path.display(),
            records.len()
        );

        if records.is_empty() {
            Ok(HistoryPoll::Empty)
        } else {
            Ok(HistoryPoll::Refreshed(records))
        }
    }
}

/// Write two demo records when no history log exists yet. Returns whether it wrote.
pub fn seed_history(path: &Path) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let demo = [
        TestRecord::new("Engine1", "Propeller1", "2024-09-08"),
        TestRecord::new("Engine2", "Propeller2", "2024-09-07"),
    ];
    let body: String = demo.iter().map(|r| r.to_line() + "\n").collect();
    fs::write(path, body)?;
    log::info!("seeded demo history at {}", path.display());
    Ok(true)
}
