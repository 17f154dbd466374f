//! Connection session.
//!
//! A [`Session`] exclusively owns one stream to the instrument and serialises
//! every exchange over it. The protocol is half-duplex with no correlation
//! ids: a command's reply must be consumed before the next command is written,
//! and unsolicited event frames may only be read while no reply is pending.
//! Callers that share a session across tasks wrap it in a
//! `tokio::sync::Mutex` and hold the lock for a whole exchange or drain cycle.
//!
//! ```text
//!            Select OK           Control OK
//! Unselected ─────────▶ Selected ──────────▶ Controlled
//!                          ▲                     │
//!                          └──── Release OK ─────┘
//! ```
//!
//! The state is tracked from successful replies for logging and inspection;
//! it is not enforced locally because the instrument rejects out-of-order
//! commands itself.

use crate::error::{ProtocolError, RgaError, RgaResult};
use crate::protocol::codec::{encode_command, BufferTier, Frame, FrameReader, COMMAND_SUFFIX};
use crate::protocol::commands::{Command, FilterMode, OnOff};
use crate::protocol::events::{decode_event, AsyncEvent, EventKind};
use crate::protocol::parser::{parse_response, vertical_fields, Layout};
use crate::protocol::response::Response;
use crate::protocol::{SensorState, ACK_MESSAGE};
use crate::transport::RgaStream;
use futures::stream::{self, Stream};
use serde::Serialize;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Ownership state of the selected sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SessionState {
    /// No sensor selected on this connection.
    #[default]
    Unselected,
    /// A sensor is selected but not controlled.
    Selected,
    /// This client holds control of the selected sensor.
    Controlled,
}

/// One point of a bar chart scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassSample {
    /// Mass position index reported by the `MassReading` event.
    pub mass_position: i64,
    /// Reading at that position.
    pub value: f64,
}

/// A live connection to one instrument.
#[derive(Debug)]
pub struct Session<S> {
    stream: S,
    reader: FrameReader,
    state: SessionState,
    read_timeout: Option<Duration>,
}

impl<S: RgaStream> Session<S> {
    /// Wraps an already connected stream. No bytes are exchanged until
    /// [`handshake`](Self::handshake) is called.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            reader: FrameReader::new(),
            state: SessionState::Unselected,
            read_timeout: None,
        }
    }

    /// Deadline applied to every frame read. `None` waits indefinitely.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Ownership state derived from the last successful replies.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Deadline applied to frame reads, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    // =========================================================================
    // Exchanges
    // =========================================================================

    /// Sends the bare terminator and checks the identification reply.
    ///
    /// Returns the greeting rows decoded vertically (e.g. `Protocol_Revision`).
    #[instrument(skip(self), err)]
    pub async fn handshake(&mut self) -> RgaResult<Response> {
        self.reader.clear();
        self.write_line(COMMAND_SUFFIX).await?;
        let frame = self.read_frame(BufferTier::Standard).await?;

        match frame.first_token() {
            Some(ACK_MESSAGE) => {
                let greeting = Response::new(ACK_MESSAGE, vertical_fields(&frame, false));
                info!(rows = frame.len(), "RGA acknowledged connection");
                Ok(greeting)
            }
            _ => Err(RgaError::Handshake {
                received: frame.row(0).unwrap_or_default().to_string(),
            }),
        }
    }

    /// Encodes `command`, writes it and decodes the reply with the layout the
    /// catalog assigns to it.
    #[instrument(skip(self, command), fields(command = command.name()), err)]
    pub async fn execute(&mut self, command: &Command) -> RgaResult<Response> {
        let response = self
            .exchange(
                command.name(),
                &command.encode(),
                command.layout(),
                command.buffer_tier(),
            )
            .await?;
        self.track_state(command);
        Ok(response)
    }

    /// Sends a command by name with pre-rendered arguments.
    ///
    /// The layout and buffer tier come from the catalog when the name is
    /// known, otherwise a vertical reply in a standard buffer is assumed.
    #[instrument(skip(self), err)]
    pub async fn execute_raw(&mut self, name: &str, args: &[String]) -> RgaResult<Response> {
        let (layout, tier) = crate::protocol::commands::descriptor(name)
            .map_or((Layout::Vertical, BufferTier::Standard), |d| (d.layout, d.tier));
        self.exchange(name, &encode_command(name, args), layout, tier)
            .await
    }

    async fn exchange(
        &mut self,
        name: &str,
        line: &str,
        layout: Layout,
        tier: BufferTier,
    ) -> RgaResult<Response> {
        if self.reader.pending() > 0 {
            warn!(
                bytes = self.reader.pending(),
                "discarding unread bytes before command"
            );
            self.reader.clear();
        }
        self.write_line(line).await?;
        let frame = self.read_frame(tier).await?;
        expect_reply_to(name, &frame)?;
        let response = parse_response(&frame, layout)?;
        debug!(command = %response.command, fields = response.fields.len(), "reply decoded");
        Ok(response)
    }

    /// Reads one unsolicited frame and classifies it.
    ///
    /// An `ERROR` status row surfaces as [`RgaError::Instrument`]; an unknown
    /// leading token as a [`ProtocolError::UnknownEvent`](crate::error::ProtocolError::UnknownEvent).
    pub async fn next_event(&mut self) -> RgaResult<AsyncEvent> {
        let frame = self.read_frame(BufferTier::Standard).await?;
        let event = decode_event(&frame)?;
        debug!(event = %event.kind(), "event received");
        Ok(event)
    }

    /// Endless stream of events. It ends after the first connection-fatal error.
    pub fn events(&mut self) -> impl Stream<Item = RgaResult<AsyncEvent>> + '_ {
        stream::unfold((self, false), |(session, finished)| async move {
            if finished {
                return None;
            }
            let event = session.next_event().await;
            let fatal = matches!(&event, Err(err) if err.is_connection_fatal());
            Some((event, (session, fatal)))
        })
    }

    /// Drains events until a mass reading at or beyond `end_mass` arrives.
    ///
    /// Returns the mass readings in arrival order. Other known events are
    /// skipped, unknown ones are logged and skipped. `cancel` is checked before
    /// each frame read; a raised flag ends the drain with [`RgaError::Cancelled`].
    #[instrument(skip(self, cancel))]
    pub async fn collect_scan(
        &mut self,
        end_mass: i64,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> RgaResult<Vec<MassSample>> {
        let mut samples = Vec::new();
        loop {
            if cancel.is_some_and(|rx| *rx.borrow()) {
                return Err(RgaError::Cancelled);
            }

            let event = match self.next_event().await {
                Ok(event) => event,
                Err(err) if err.is_unknown_event() => {
                    warn!(error = %err, "skipping unrecognised frame");
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Some((mass_position, value)) = event.mass_reading() {
                samples.push(MassSample {
                    mass_position,
                    value,
                });
                if mass_position >= end_mass {
                    debug!(samples = samples.len(), "scan complete");
                    return Ok(samples);
                }
            }
        }
    }

    // =========================================================================
    // Common commands
    // =========================================================================

    /// Lists the sensors visible to the server.
    pub async fn sensors(&mut self) -> RgaResult<Response> {
        self.execute(&Command::Sensors).await
    }

    /// Selects a sensor by serial number.
    pub async fn select(&mut self, serial_number: &str) -> RgaResult<Response> {
        self.execute(&Command::Select(serial_number.to_string()))
            .await
    }

    /// Reads the `State` field of `SensorState`.
    pub async fn sensor_state(&mut self) -> RgaResult<SensorState> {
        let response = self.execute(&Command::SensorState).await?;
        Ok(SensorState::from_token(
            &response.get_str("State").unwrap_or_default(),
        ))
    }

    /// Reads the sensor description.
    pub async fn info(&mut self) -> RgaResult<Response> {
        self.execute(&Command::Info).await
    }

    /// Takes control of the selected sensor.
    pub async fn control(&mut self, app_name: &str, version: &str) -> RgaResult<Response> {
        self.execute(&Command::Control {
            app_name: app_name.to_string(),
            version: version.to_string(),
        })
        .await
    }

    /// Gives up control of the sensor.
    pub async fn release(&mut self) -> RgaResult<Response> {
        self.execute(&Command::Release).await
    }

    /// Switches the filament on or off.
    pub async fn filament_control(&mut self, state: OnOff) -> RgaResult<Response> {
        self.execute(&Command::FilamentControl(state)).await
    }

    /// Defines a bar chart measurement with the given mass range.
    #[allow(clippy::too_many_arguments)]
    pub async fn add_barchart(
        &mut self,
        name: &str,
        start_mass: i64,
        end_mass: i64,
        filter_mode: FilterMode,
        accuracy: i64,
        egain_index: i64,
        source_index: i64,
        detector_index: i64,
    ) -> RgaResult<Response> {
        self.execute(&Command::AddBarchart {
            name: name.to_string(),
            start_mass,
            end_mass,
            filter_mode,
            accuracy,
            egain_index,
            source_index,
            detector_index,
        })
        .await
    }

    /// Adds a defined measurement to the scan list.
    pub async fn scan_add(&mut self, measurement: &str) -> RgaResult<Response> {
        self.execute(&Command::ScanAdd(measurement.to_string()))
            .await
    }

    /// Starts `num_scans` scans of the scan list.
    pub async fn scan_resume(&mut self, num_scans: i64) -> RgaResult<Response> {
        self.execute(&Command::ScanResume(num_scans)).await
    }

    /// Stops the running scan.
    ///
    /// Unlike [`execute`](Self::execute) this keeps reading past event frames
    /// that were already in flight until the `ScanStop` reply arrives, so it
    /// can follow an interrupted [`collect_scan`](Self::collect_scan).
    #[instrument(skip(self), err)]
    pub async fn scan_stop(&mut self) -> RgaResult<Response> {
        let command = Command::ScanStop;
        self.write_line(&command.encode()).await?;
        loop {
            let frame = self.read_frame(command.buffer_tier()).await?;
            match frame.first_token() {
                Some(token)
                    if token != command.name() && EventKind::from_token(token).is_some() =>
                {
                    debug!(event = token, "skipping event while stopping scan");
                }
                _ => {
                    expect_reply_to(command.name(), &frame)?;
                    return parse_response(&frame, command.layout());
                }
            }
        }
    }

    /// Shuts down the write half of the stream.
    pub async fn close(&mut self) -> RgaResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn write_line(&mut self, line: &str) -> RgaResult<()> {
        debug!(line = %line.escape_debug(), "sending");
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self, tier: BufferTier) -> RgaResult<Frame> {
        let read = self.reader.read_frame(&mut self.stream, tier);
        match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| RgaError::Timeout(limit))?,
            None => read.await,
        }
    }

    fn track_state(&mut self, command: &Command) {
        let next = match command {
            Command::Select(_) => SessionState::Selected,
            Command::Control { .. } => SessionState::Controlled,
            Command::Release if self.state == SessionState::Controlled => SessionState::Selected,
            _ => return,
        };
        if next != self.state {
            info!(from = ?self.state, to = ?next, "session state changed");
            self.state = next;
        }
    }
}

fn expect_reply_to(name: &str, frame: &Frame) -> RgaResult<()> {
    match frame.first_token() {
        Some(token) if token == name => Ok(()),
        other => Err(ProtocolError::UnexpectedReply {
            expected: name.to_string(),
            received: other.unwrap_or_default().to_string(),
        }
        .into()),
    }
}
