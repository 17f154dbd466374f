//! Wire framing.
//!
//! Protocol Overview:
//! - Transport: ASCII over a TCP stream, strictly half-duplex
//! - Command terminator: LF+CR (`\n\r`)
//! - Row separator: CR+LF (`\r\n`)
//! - Frame terminator: CR+LF+CR+CR (`\r\n\r\r`)
//! - First row of every frame: `<Name> <Status>` for replies, `<EventName> <args...>`
//!   for unsolicited events
//!
//! There is no length prefix and no correlation id. [`FrameReader`] accumulates
//! bytes until the terminator appears and hands out one [`Frame`] at a time;
//! bytes that follow a terminator in the same read are kept for the next call,
//! which matters while a scan streams one event frame per mass.

use crate::error::{ProtocolError, RgaError, RgaResult};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

/// Appended to every outgoing command.
pub const COMMAND_SUFFIX: &str = "\n\r";
/// Separates rows inside a frame.
pub const ROW_DELIMITER: &[u8] = b"\r\n";
/// Ends every incoming frame.
pub const FRAME_TERMINATOR: &[u8] = b"\r\n\r\r";

/// Default receive capacity.
pub const STANDARD_CAPACITY: usize = 4096;
/// Receive capacity for replies that enumerate many fields.
pub const LARGE_CAPACITY: usize = 16384;

const READ_CHUNK: usize = 1024;

/// Receive buffer size class for a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferTier {
    /// [`STANDARD_CAPACITY`]
    #[default]
    Standard,
    /// [`LARGE_CAPACITY`]
    Large,
}

impl BufferTier {
    /// Buffer size in bytes.
    pub fn capacity(self) -> usize {
        match self {
            BufferTier::Standard => STANDARD_CAPACITY,
            BufferTier::Large => LARGE_CAPACITY,
        }
    }
}

/// Renders `name` and its pre-formatted arguments as one command line.
pub fn encode_command<S: AsRef<str>>(name: &str, args: &[S]) -> String {
    let mut line = String::from(name);
    for arg in args {
        line.push(' ');
        line.push_str(arg.as_ref());
    }
    line.push_str(COMMAND_SUFFIX);
    line
}

/// One terminator-delimited unit of traffic, split into text rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    rows: Vec<String>,
}

impl Frame {
    /// Splits raw frame bytes (terminator already removed) into rows.
    ///
    /// Trailing blank rows are dropped; invalid UTF-8 is replaced lossily.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut rows: Vec<String> = split_rows(bytes)
            .map(|row| String::from_utf8_lossy(row).into_owned())
            .collect();
        while rows.last().is_some_and(|row| row.trim().is_empty()) {
            rows.pop();
        }
        Self { rows }
    }

    /// Builds a frame from already split rows.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    /// All rows in order.
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Row at `index`, if present.
    pub fn row(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(String::as_str)
    }

    /// Whitespace-delimited tokens of a row; empty when the row does not exist.
    pub fn tokens(&self, index: usize) -> Vec<&str> {
        self.row(index)
            .map(|row| row.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// First token of the first row: the command or event name.
    pub fn first_token(&self) -> Option<&str> {
        self.row(0).and_then(|row| row.split_whitespace().next())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a frame from the given row indices of this one, skipping any
    /// index that is out of range.
    pub fn select_rows(&self, indices: impl IntoIterator<Item = usize>) -> Frame {
        Frame {
            rows: indices
                .into_iter()
                .filter_map(|i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

/// Splits on the row delimiter.
pub fn split_rows(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(bytes);
    std::iter::from_fn(move || {
        let current = rest?;
        match find(current, ROW_DELIMITER) {
            Some(pos) => {
                rest = Some(&current[pos + ROW_DELIMITER.len()..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Accumulates bytes from a stream and yields complete frames.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: BytesMut,
}

impl FrameReader {
    /// Empty reader.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(STANDARD_CAPACITY),
        }
    }

    /// Bytes received after the last delivered frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drops any buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Reads until one complete frame is available.
    ///
    /// Frames consisting only of whitespace are skipped. Fails with
    /// [`RgaError::ConnectionClosed`] on EOF and with
    /// [`ProtocolError::MissingTerminator`] when `tier`'s capacity fills up
    /// before a terminator is seen.
    pub async fn read_frame<R>(&mut self, reader: &mut R, tier: BufferTier) -> RgaResult<Frame>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let capacity = tier.capacity();
        loop {
            while let Some(pos) = find(&self.buf, FRAME_TERMINATOR) {
                let raw = self.buf.split_to(pos);
                self.buf.advance(FRAME_TERMINATOR.len());
                trace!(frame = %raw.escape_ascii(), "frame received");
                let frame = Frame::from_bytes(&raw);
                if !frame.is_empty() {
                    return Ok(frame);
                }
            }

            if self.buf.len() >= capacity {
                return Err(ProtocolError::MissingTerminator { capacity }.into());
            }

            let mut chunk = [0u8; READ_CHUNK];
            let want = (capacity - self.buf.len()).min(READ_CHUNK);
            let n = reader.read(&mut chunk[..want]).await?;
            if n == 0 {
                return Err(RgaError::ConnectionClosed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
