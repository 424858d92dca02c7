//! Event log parsing.
//!
//! Parsing never fails outright. A missing file yields an empty log, short
//! rows are dropped one by one, and the first unparsable row stops the read
//! while keeping every record accumulated before it.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::{EventRecord, LogFormat, ReplayError};

/// Ordered records read from one event log, plus what was left out.
#[derive(Debug, Default)]
pub struct EventLog {
    pub records: Vec<EventRecord>,
    /// Lines dropped for having too few fields.
    pub skipped_lines: Vec<usize>,
    /// The error that stopped parsing early, if any.
    pub aborted: Option<ReplayError>,
}

impl EventLog {
    /// Reads the log at `path`.
    pub async fn load(path: impl AsRef<Path>, format: &LogFormat) -> Self {
        let path = path.as_ref();
        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "event log does not exist");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to open event log");
                return Self {
                    aborted: Some(err.into()),
                    ..Self::default()
                };
            }
        };

        let log = Self::from_reader(BufReader::new(file), format).await;
        info!(
            path = %path.display(),
            records = log.records.len(),
            skipped = log.skipped_lines.len(),
            "event log loaded"
        );
        log
    }

    /// Parses a log from any buffered reader, row order preserved.
    pub async fn from_reader<R>(reader: R, format: &LogFormat) -> Self
    where
        R: AsyncBufRead + Unpin,
    {
        let mut log = Self::default();
        let mut lines = reader.lines();
        let mut line_no = 0;

        loop {
            let row = match lines.next_line().await {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(err) => {
                    warn!(line = line_no + 1, error = %err, "failed to read event log");
                    log.aborted = Some(err.into());
                    break;
                }
            };
            line_no += 1;

            if line_no == 1 && format.has_header {
                continue;
            }

            let row = row.strip_suffix('\r').unwrap_or(row.as_str());
            match EventRecord::parse_row(line_no, row, format) {
                Ok(Some(record)) => log.records.push(record),
                Ok(None) => {
                    debug!(line = line_no, "skipping short row");
                    log.skipped_lines.push(line_no);
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        kept = log.records.len(),
                        "stopping event log parse"
                    );
                    log.aborted = Some(err);
                    break;
                }
            }
        }

        log
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
