//! One-shot bounded literal search over a log file.

use std::path::Path;

use procstream_core::{StreamError, StreamResult};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::tail::{READ_CHUNK, decode_line};

/// Matches returned by a search, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    pub lines: Vec<String>,
    pub count: usize,
}

/// Scans files for a case-sensitive literal substring.
///
/// Each search opens its own read cursor; nothing is shared with tailers.
#[derive(Debug, Clone, Copy)]
pub struct SearchExecutor {
    max_results: usize,
}

impl SearchExecutor {
    pub const fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub const fn max_results(&self) -> usize {
        self.max_results
    }

    /// Return up to `max_results` lines of `path` containing `pattern`.
    ///
    /// Stops reading as soon as the cap is reached. An empty pattern matches
    /// every non-blank line; zero matches is not an error.
    pub async fn search(&self, path: &Path, pattern: &str) -> StreamResult<SearchOutcome> {
        if self.max_results == 0 {
            return Ok(SearchOutcome::default());
        }

        let file = File::open(path)
            .await
            .map_err(|e| StreamError::from_io(&e, path))?;
        let mut reader = BufReader::with_capacity(READ_CHUNK, file);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        let mut lines = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| StreamError::from_io(&e, path))?;
            if read == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }

            if let Some(line) = decode_line(&buf).filter(|l| l.contains(pattern)) {
                lines.push(line);
                if lines.len() >= self.max_results {
                    break;
                }
            }
        }

        debug!(path = %path.display(), pattern, matches = lines.len(), "Search finished");

        Ok(SearchOutcome {
            count: lines.len(),
            lines,
        })
    }
}
