//! # mks-rga
//!
//! Async client for the ASCII control protocol spoken by MKS residual gas
//! analyzers over TCP.
//!
//! ## Crate Structure
//!
//! - **`protocol`**: transport-agnostic engine. Frame slicing, status and
//!   error extraction, the horizontal / vertical / composite tabular parsers,
//!   the unsolicited event classifier and the command catalog.
//! - **`session`**: [`Session`] owns one stream, performs the handshake,
//!   serialises command exchanges and drains event frames.
//! - **`transport`**: the [`RgaStream`](transport::RgaStream) capability alias
//!   and a TCP connect helper.
//! - **`recorder`**: periodic bar chart acquisition publishing one
//!   [`DataFrame`](recorder::DataFrame) per scan.
//! - **`config`**: figment-backed [`Settings`](config::Settings).
//! - **`logging`**: tracing-subscriber setup.
//! - **`error`**: [`RgaError`] and its transport / protocol / instrument split.
//! - **`mock_stream`**: scripted in-memory instrument for tests.
//!
//! ## Example
//!
//! ```no_run
//! use mks_rga::{transport, Command, Session};
//! use std::time::Duration;
//!
//! # async fn run() -> mks_rga::RgaResult<()> {
//! let stream = transport::connect("10.0.0.12:10014", Duration::from_secs(5)).await?;
//! let mut session = Session::new(stream);
//! session.handshake().await?;
//!
//! let sensors = session.execute(&Command::Sensors).await?;
//! for (name, value) in &sensors.fields {
//!     println!("{name} = {value}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod mock_stream;
pub mod protocol;
pub mod recorder;
pub mod session;
pub mod transport;

pub use error::{InstrumentError, ProtocolError, RgaError, RgaResult};
pub use protocol::{
    AsyncEvent, Command, EventKind, Fields, Frame, Layout, Response, ScalarValue, SensorState,
    Status,
};
pub use session::{MassSample, Session, SessionState};
