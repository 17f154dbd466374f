//! In-memory instrument stream for tests.
//!
//! [`MockRgaStream`] implements `AsyncRead` and `AsyncWrite` and is handed to a
//! [`Session`](crate::session::Session) in place of a TCP socket.
//! [`MockInstrument`] stays with the test and scripts the instrument side:
//! it asserts on command lines written by the client and pushes reply or
//! event frames back.
//!
//! # Example
//!
//! ```rust,ignore
//! use mks_rga::{mock_stream, Session};
//!
//! #[tokio::test]
//! async fn sensor_state() {
//!     let (stream, mut rga) = mock_stream::new();
//!     let mut session = Session::new(stream);
//!
//!     let client = tokio::spawn(async move { session.sensor_state().await });
//!
//!     rga.expect_and_respond_frame(b"SensorState\n\r", &["SensorState OK", "State InUse"])
//!         .await;
//!     assert_eq!(client.await.unwrap().unwrap().as_str(), "InUse");
//! }
//! ```

use crate::protocol::codec::{FRAME_TERMINATOR, ROW_DELIMITER};
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{timeout, Duration};

/// Client side of the mock connection.
#[derive(Debug)]
pub struct MockRgaStream {
    writes_tx: UnboundedSender<Vec<u8>>,
    reads_rx: UnboundedReceiver<Vec<u8>>,
    /// Bytes pushed by the instrument but not yet read by the client
    read_buffer: VecDeque<u8>,
}

/// Instrument side of the mock connection.
#[derive(Debug)]
pub struct MockInstrument {
    writes_rx: UnboundedReceiver<Vec<u8>>,
    reads_tx: UnboundedSender<Vec<u8>>,
    /// Bytes written by the client but not yet asserted
    write_buffer: Vec<u8>,
}

/// Creates a connected stream/instrument pair.
pub fn new() -> (MockRgaStream, MockInstrument) {
    let (client_to_rga_tx, client_to_rga_rx) = mpsc::unbounded_channel();
    let (rga_to_client_tx, rga_to_client_rx) = mpsc::unbounded_channel();

    let stream = MockRgaStream {
        writes_tx: client_to_rga_tx,
        reads_rx: rga_to_client_rx,
        read_buffer: VecDeque::new(),
    };

    let instrument = MockInstrument {
        writes_rx: client_to_rga_rx,
        reads_tx: rga_to_client_tx,
        write_buffer: Vec::new(),
    };

    (stream, instrument)
}

/// Renders rows as one terminated frame.
pub fn frame_bytes(rows: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            bytes.extend_from_slice(ROW_DELIMITER);
        }
        bytes.extend_from_slice(row.as_bytes());
    }
    bytes.extend_from_slice(FRAME_TERMINATOR);
    bytes
}

// =============================================================================
// MockRgaStream
// =============================================================================

impl MockRgaStream {
    fn fill(&mut self, buf: &mut ReadBuf<'_>) {
        let to_read = buf.remaining().min(self.read_buffer.len());
        let chunk: Vec<u8> = self.read_buffer.drain(..to_read).collect();
        buf.put_slice(&chunk);
    }
}

impl AsyncRead for MockRgaStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.read_buffer.is_empty() {
            self.fill(buf);
            return Poll::Ready(Ok(()));
        }

        match self.reads_rx.poll_recv(cx) {
            Poll::Ready(Some(chunk)) => {
                self.read_buffer.extend(chunk);
                self.fill(buf);
                Poll::Ready(Ok(()))
            }
            // Instrument dropped: end of stream
            Poll::Ready(None) => Poll::Ready(Ok(())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl AsyncWrite for MockRgaStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.writes_tx.send(buf.to_vec()) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(_) => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock instrument disconnected",
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

// =============================================================================
// MockInstrument
// =============================================================================

impl MockInstrument {
    /// Pushes raw bytes to the client.
    ///
    /// # Errors
    /// Returns error if the client stream has been dropped
    pub fn send_response(&self, data: &[u8]) -> Result<(), &'static str> {
        self.reads_tx
            .send(data.to_vec())
            .map_err(|_| "Failed to send response: client stream disconnected")
    }

    /// Pushes `rows` as one terminated frame.
    ///
    /// # Errors
    /// Returns error if the client stream has been dropped
    pub fn send_frame(&self, rows: &[&str]) -> Result<(), &'static str> {
        self.send_response(&frame_bytes(rows))
    }

    /// Pushes one `MassReading` event frame.
    ///
    /// # Errors
    /// Returns error if the client stream has been dropped
    pub fn send_mass_reading(&self, mass_position: i64, value: f64) -> Result<(), &'static str> {
        let row = format!("MassReading {mass_position} {value:e}");
        self.send_frame(&[&row])
    }

    /// Waits for the client to write `expected` and asserts on it.
    ///
    /// Writes are buffered until enough bytes arrived; excess bytes are kept
    /// for the next expectation.
    ///
    /// # Panics
    /// Panics if the bytes do not arrive within 2 seconds or do not match.
    pub async fn expect_write(&mut self, expected: &[u8]) {
        let timeout_duration = Duration::from_secs(2);

        while self.write_buffer.len() < expected.len() {
            match timeout(timeout_duration, self.writes_rx.recv()).await {
                Ok(Some(chunk)) => self.write_buffer.extend_from_slice(&chunk),
                Ok(None) => panic!("Client stream closed while expecting a write."),
                Err(_) => panic!(
                    "Timeout waiting for write. Expected `{:?}`, received `{:?}`.",
                    String::from_utf8_lossy(expected),
                    String::from_utf8_lossy(&self.write_buffer),
                ),
            }
        }

        let actual = &self.write_buffer[..expected.len()];
        assert_eq!(
            actual,
            expected,
            "Mismatch in expected write. Expected `{:?}`, got `{:?}`.",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(actual)
        );
        self.write_buffer.drain(..expected.len());
    }

    /// Expects a write and replies with one frame built from `rows`.
    pub async fn expect_and_respond_frame(&mut self, expected: &[u8], rows: &[&str]) {
        self.expect_write(expected).await;
        self.send_frame(rows).expect("Failed to send frame");
    }
}
