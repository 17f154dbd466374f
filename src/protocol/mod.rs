//! MKS RGA ASCII protocol engine.
//!
//! The engine is transport agnostic: [`codec`] slices bytes into frames,
//! [`status`] validates the status row, [`parser`] decodes tabular replies,
//! [`events`] classifies unsolicited frames and [`commands`] renders outgoing
//! command lines. [`crate::session::Session`] ties them to a live stream.

pub mod codec;
pub mod commands;
pub mod events;
pub mod parser;
pub mod response;
pub mod status;
pub mod value;

pub use codec::{BufferTier, Frame, FrameReader};
pub use commands::{
    AudioMode, CalibrationOption, CirrusHeaterMode, Command, CommandDescriptor, FilterMode,
    OnOff, RvcValveMode, ZeroBufferMode, CATALOG,
};
pub use events::{AsyncEvent, EventKind};
pub use parser::Layout;
pub use response::{Fields, Response, Status};
pub use value::ScalarValue;

/// Identification token sent by the instrument on first contact.
pub const ACK_MESSAGE: &str = "MKSRGA";

/// Values of the `State` field returned by `SensorState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorState {
    /// Powered and free to be controlled.
    Ready,
    /// Controlled by a client.
    InUse,
    /// Being configured.
    Config,
    /// `N/A`: not reachable.
    NotAvailable,
    /// Any other token, kept verbatim.
    Other(String),
}

impl SensorState {
    /// Maps a `State` token; unknown tokens become [`SensorState::Other`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "Ready" => SensorState::Ready,
            "InUse" => SensorState::InUse,
            "Config" => SensorState::Config,
            "N/A" => SensorState::NotAvailable,
            other => SensorState::Other(other.to_string()),
        }
    }

    /// Wire token.
    pub fn as_str(&self) -> &str {
        match self {
            SensorState::Ready => "Ready",
            SensorState::InUse => "InUse",
            SensorState::Config => "Config",
            SensorState::NotAvailable => "N/A",
            SensorState::Other(other) => other,
        }
    }
}

impl std::fmt::Display for SensorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
