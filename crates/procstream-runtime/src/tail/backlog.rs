//! Backlog reconstruction from disk.

use std::io::SeekFrom;
use std::path::Path;

use procstream_core::{StreamError, StreamResult};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{MAX_LINE_BYTES, decode_line};

/// Block size used when scanning a file backwards.
const BACKLOG_BLOCK: usize = 8 * 1024;

/// Read the last `limit` non-blank lines of `path` that end at or before byte
/// offset `end`, in file order.
///
/// The file is scanned backwards from `end` one block at a time and every
/// byte is looked at once, so cost is proportional to the backlog size rather
/// than the file size. A line longer than [`MAX_LINE_BYTES`] is cut to its
/// last `MAX_LINE_BYTES` bytes and ends the scan. `end` is clamped to the
/// current file length.
pub async fn read_backlog(path: &Path, end: u64, limit: usize) -> StreamResult<Vec<String>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let io_err = |e: std::io::Error| StreamError::from_io(&e, path);
    let mut file = File::open(path).await.map_err(io_err)?;
    let len = file.metadata().await.map_err(io_err)?.len();

    let mut start = end.min(len);
    let mut scan = BackwardLines::new(limit);
    let mut block = vec![0u8; BACKLOG_BLOCK];

    while start > 0 && !scan.is_done() {
        let step = usize::try_from(start).map_or(BACKLOG_BLOCK, |s| s.min(BACKLOG_BLOCK));
        start -= step as u64;

        let block = &mut block[..step];
        file.seek(SeekFrom::Start(start)).await.map_err(io_err)?;
        file.read_exact(block).await.map_err(io_err)?;
        scan.push_block(block);
    }

    Ok(scan.finish(start == 0))
}

/// Lines collected while a file is read back to front.
#[derive(Debug)]
struct BackwardLines {
    limit: usize,
    /// Newest first.
    lines: Vec<String>,
    /// Bytes of the line being assembled, last byte first.
    partial_rev: Vec<u8>,
    truncated: bool,
}

impl BackwardLines {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            lines: Vec::with_capacity(limit.min(1024)),
            partial_rev: Vec::new(),
            truncated: false,
        }
    }

    fn is_done(&self) -> bool {
        self.truncated || self.lines.len() >= self.limit
    }

    /// Feed the block that precedes everything fed so far.
    fn push_block(&mut self, block: &[u8]) {
        for &byte in block.iter().rev() {
            if byte == b'\n' {
                self.complete_line();
                if self.is_done() {
                    return;
                }
            } else if self.partial_rev.len() < MAX_LINE_BYTES {
                self.partial_rev.push(byte);
            } else {
                self.truncated = true;
                self.complete_line();
                return;
            }
        }
    }

    fn complete_line(&mut self) {
        self.partial_rev.reverse();
        if let Some(line) = decode_line(&self.partial_rev) {
            self.lines.push(line);
        }
        self.partial_rev.clear();
    }

    /// Lines in file order. At the head of the file the pending bytes form
    /// the first line.
    fn finish(mut self, reached_file_head: bool) -> Vec<String> {
        if reached_file_head && !self.is_done() {
            self.complete_line();
        }
        self.lines.truncate(self.limit);
        self.lines.reverse();
        self.lines
    }
}
