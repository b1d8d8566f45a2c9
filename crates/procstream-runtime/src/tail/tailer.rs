//! Incremental log file follower.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_stream::stream;
use futures_util::Stream;
use procstream_core::{RotationPolicy, StreamError, StreamResult, StreamSettings};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::gauge::{TailerGauge, TailerGuard};
use super::{MAX_LINE_BYTES, READ_CHUNK, decode_line};

/// Consecutive polls that must find the path missing before giving up.
///
/// Rotation tools rename the file and create a new one; the path is briefly
/// absent in between.
const MISSING_POLLS_BEFORE_FAILURE: u32 = 3;

/// Block size for locating the last line boundary on open.
const BOUNDARY_BLOCK: usize = 8 * 1024;

/// Tailer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    pub poll_interval: Duration,
    pub rotation: RotationPolicy,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self::from(&StreamSettings::default())
    }
}

impl From<&StreamSettings> for TailOptions {
    fn from(settings: &StreamSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            rotation: settings.rotation,
        }
    }
}

/// Identity of the file behind a path (device and inode on Unix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    pub fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn of(_meta: &Metadata) -> Option<Self> {
        // No stable identity; only truncation is detected
        None
    }
}

/// Event produced by [`Tailer::follow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailEvent {
    /// Newly completed lines, in file order.
    ///
    /// `boundary` is the byte offset just past the last complete line read so
    /// far; everything before it has been delivered.
    Lines { lines: Vec<String>, boundary: u64 },

    /// The file was truncated or replaced and is now followed from offset 0.
    Rotated,

    /// Terminal read failure. The stream ends after this event.
    Failed(StreamError),
}

/// Result of a single [`Tailer::poll`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Polled {
    /// The cursor was reset to the start of a new or truncated file.
    pub rotated: bool,
    /// Complete lines read by this poll.
    pub lines: Vec<String>,
    /// More bytes are already available past the chunk just read.
    pub more: bool,
}

/// One open read cursor on one log file.
///
/// Created by [`Tailer::open`], consumed by [`Tailer::follow`]. Dropping the
/// tailer closes the file handle.
#[derive(Debug)]
pub struct Tailer {
    path: PathBuf,
    file: File,
    identity: Option<FileIdentity>,
    /// Bytes consumed from the current file, including `partial`.
    offset: u64,
    /// Offset just past the last complete line.
    delivered: u64,
    partial: Vec<u8>,
    missing_polls: u32,
    options: TailOptions,
    _guard: Option<TailerGuard>,
}

impl Tailer {
    /// Open `path` and position the cursor after its last complete line.
    ///
    /// A trailing line without a newline is left unread and delivered once
    /// its newline arrives.
    pub async fn open(path: impl Into<PathBuf>, options: TailOptions) -> StreamResult<Self> {
        let path = path.into();
        let io_err = |e: io::Error| StreamError::from_io(&e, &path);

        let mut file = File::open(&path).await.map_err(io_err)?;
        let meta = file.metadata().await.map_err(io_err)?;
        let offset = last_line_boundary(&mut file, meta.len())
            .await
            .map_err(io_err)?;

        debug!(path = %path.display(), offset, "Opened log tailer");

        Ok(Self {
            identity: FileIdentity::of(&meta),
            path,
            file,
            offset,
            delivered: offset,
            partial: Vec::new(),
            missing_polls: 0,
            options,
            _guard: None,
        })
    }

    /// Count this tailer in `gauge` for as long as it lives.
    #[must_use]
    pub fn tracked(mut self, gauge: &TailerGauge) -> Self {
        self._guard = Some(gauge.track());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset just past the last complete line read.
    pub const fn delivered_offset(&self) -> u64 {
        self.delivered
    }

    /// Check the file once and read at most one chunk of new bytes.
    pub async fn poll(&mut self) -> StreamResult<Polled> {
        let mut rotated = false;

        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => {
                self.missing_polls = 0;
                if self.options.rotation == RotationPolicy::Reopen
                    && FileIdentity::of(&meta) != self.identity
                {
                    self.reopen().await?;
                    rotated = true;
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.missing_polls += 1;
                if self.missing_polls >= MISSING_POLLS_BEFORE_FAILURE {
                    return Err(StreamError::from_io(&err, &self.path));
                }
                return Ok(Polled::default());
            }
            Err(err) => return Err(StreamError::from_io(&err, &self.path)),
        }

        let len = self.file_len().await?;
        if len < self.offset && self.options.rotation == RotationPolicy::Reopen {
            info!(path = %self.path.display(), "Log file truncated, following from start");
            self.rewind();
            rotated = true;
        }

        if len <= self.offset {
            return Ok(Polled {
                rotated,
                ..Polled::default()
            });
        }

        let want = usize::try_from(len - self.offset).map_or(READ_CHUNK, |n| n.min(READ_CHUNK));
        let mut chunk = vec![0u8; want];
        self.file
            .seek(SeekFrom::Start(self.offset))
            .await
            .map_err(|e| self.io_error(&e))?;
        let read = self
            .file
            .read(&mut chunk)
            .await
            .map_err(|e| self.io_error(&e))?;
        chunk.truncate(read);
        self.offset += read as u64;

        let lines = self.split_lines(&chunk);
        Ok(Polled {
            rotated,
            lines,
            more: read > 0 && self.offset < len,
        })
    }

    /// Follow the file until `cancel` fires or a read fails.
    ///
    /// Polls every `poll_interval`; when a poll leaves bytes unread the next
    /// chunk is read immediately. The stream owns the tailer, so the file
    /// handle is released when the stream is dropped.
    pub fn follow(self, cancel: CancellationToken) -> impl Stream<Item = TailEvent> {
        let poll_interval = self.options.poll_interval;

        stream! {
            let mut tailer = self;
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(path = %tailer.path.display(), offset = tailer.offset, "Starting tailer");

            'follow: loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = cancel.cancelled() => {
                        debug!(path = %tailer.path.display(), "Tailer cancelled");
                        break;
                    }
                }

                loop {
                    match tailer.poll().await {
                        Ok(polled) => {
                            if polled.rotated {
                                yield TailEvent::Rotated;
                            }
                            if !polled.lines.is_empty() {
                                yield TailEvent::Lines {
                                    lines: polled.lines,
                                    boundary: tailer.delivered,
                                };
                            }
                            if !polled.more || cancel.is_cancelled() {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(path = %tailer.path.display(), error = %err, "Tailer stopped");
                            yield TailEvent::Failed(err);
                            break 'follow;
                        }
                    }
                }
            }
        }
    }

    async fn reopen(&mut self) -> StreamResult<()> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| self.io_error(&e))?;
        let meta = file.metadata().await.map_err(|e| self.io_error(&e))?;

        info!(path = %self.path.display(), "Log file replaced, reopening");

        self.file = file;
        self.identity = FileIdentity::of(&meta);
        self.rewind();
        Ok(())
    }

    fn rewind(&mut self) {
        self.offset = 0;
        self.delivered = 0;
        self.partial.clear();
    }

    async fn file_len(&self) -> StreamResult<u64> {
        self.file
            .metadata()
            .await
            .map(|m| m.len())
            .map_err(|e| self.io_error(&e))
    }

    fn split_lines(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut carry = std::mem::take(&mut self.partial);
        carry.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for (idx, byte) in carry.iter().enumerate() {
            if *byte == b'\n' {
                lines.extend(decode_line(&carry[start..idx]));
                start = idx + 1;
            }
        }

        let remainder = carry.split_off(start);
        // An overlong partial line is emitted as-is instead of buffered
        if remainder.len() > MAX_LINE_BYTES {
            lines.extend(decode_line(&remainder));
        } else {
            self.partial = remainder;
        }
        self.delivered = self.offset - self.partial.len() as u64;
        lines
    }

    fn io_error(&self, err: &io::Error) -> StreamError {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                StreamError::from_io(err, &self.path)
            }
            _ => StreamError::TailerIo(format!("{}: {err}", self.path.display())),
        }
    }
}

/// Offset just past the last `\n` in the first `len` bytes of `file`.
async fn last_line_boundary(file: &mut File, len: u64) -> io::Result<u64> {
    let mut block = vec![0u8; BOUNDARY_BLOCK];
    let mut end = len;

    while end > 0 {
        let step = usize::try_from(end).map_or(BOUNDARY_BLOCK, |e| e.min(BOUNDARY_BLOCK));
        let start = end - step as u64;
        file.seek(SeekFrom::Start(start)).await?;
        file.read_exact(&mut block[..step]).await?;
        if let Some(pos) = block[..step].iter().rposition(|b| *b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }

    Ok(0)
}
