//! Unsolicited event frames.
//!
//! While a scan is running the instrument pushes frames that are not replies
//! to any command. They are recognised only by their leading token:
//!
//! ```text
//! StartingScan 12 73412 0
//! StartingMeasurement Bar1
//! ZeroReading 5.5 1.0e-12        (mass position, value)
//! MassReading 28 2.3e-07
//! ```
//!
//! Most events carry a fixed positional schema on their first row and are
//! decoded by role, without inference. `MultiplierStatus`, `VSCEvent` and
//! `DegasReading` are multi-row vertical blocks; they are rewritten as an `OK`
//! reply and handed to the vertical parser.

use super::codec::Frame;
use super::parser::vertical_fields;
use super::response::{Fields, Response, Status};
use super::status::decode_error;
use super::value::{parse_float, ScalarValue};
use crate::error::{ProtocolError, RgaError, RgaResult};
use serde::Serialize;
use std::fmt;

/// Names of all recognised events.
///
/// Each variant is the event's wire token, see [`EventKind::as_str`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    StartingScan,
    StartingMeasurement,
    ZeroReading,
    MassReading,
    FilamentTimeRemaining,
    MultiplierStatus,
    RfTripState,
    InletChange,
    AnalogInput,
    TotalPressure,
    DigitalPortChange,
    LinkDown,
    VscEvent,
    DegasReading,
}

impl EventKind {
    /// Every kind in declaration order.
    pub const ALL: [EventKind; 14] = [
        EventKind::StartingScan,
        EventKind::StartingMeasurement,
        EventKind::ZeroReading,
        EventKind::MassReading,
        EventKind::FilamentTimeRemaining,
        EventKind::MultiplierStatus,
        EventKind::RfTripState,
        EventKind::InletChange,
        EventKind::AnalogInput,
        EventKind::TotalPressure,
        EventKind::DigitalPortChange,
        EventKind::LinkDown,
        EventKind::VscEvent,
        EventKind::DegasReading,
    ];

    /// Wire token for this event.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StartingScan => "StartingScan",
            EventKind::StartingMeasurement => "StartingMeasurement",
            EventKind::ZeroReading => "ZeroReading",
            EventKind::MassReading => "MassReading",
            EventKind::FilamentTimeRemaining => "FilamentTimeRemaining",
            EventKind::MultiplierStatus => "MultiplierStatus",
            EventKind::RfTripState => "RFTripState",
            EventKind::InletChange => "InletChange",
            EventKind::AnalogInput => "AnalogInput",
            EventKind::TotalPressure => "TotalPressure",
            EventKind::DigitalPortChange => "DigitalPortChange",
            EventKind::LinkDown => "LinkDown",
            EventKind::VscEvent => "VSCEvent",
            EventKind::DegasReading => "DegasReading",
        }
    }

    /// Kind whose wire token is exactly `token`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == token)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded unsolicited frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AsyncEvent {
    /// A scan of the scan list began.
    StartingScan {
        /// Running scan counter.
        scan_number: i64,
        /// Instrument clock time.
        time: String,
        /// Scans left before the instrument pauses.
        scans_remaining: i64,
    },
    /// A measurement within the scan began.
    StartingMeasurement {
        /// Measurement name.
        name: String,
    },
    /// Zero reference taken for a mass position.
    ZeroReading {
        /// Mass position index.
        mass_position: i64,
        /// Zero level.
        value: f64,
    },
    /// One data point of the running measurement.
    MassReading {
        /// Mass position index.
        mass_position: i64,
        /// Reading.
        value: f64,
    },
    /// Remaining filament lifetime.
    FilamentTimeRemaining {
        /// Remaining time as reported.
        time: f64,
    },
    /// Multiplier state block.
    MultiplierStatus(Fields),
    /// RF trip state changed.
    RfTripState {
        /// New state token.
        state: String,
    },
    /// Active inlet changed.
    InletChange {
        /// Inlet index.
        index: i64,
    },
    /// Analog input sample.
    AnalogInput {
        /// Input index.
        index: i64,
        /// Sampled value.
        value: f64,
    },
    /// Total pressure reading.
    TotalPressure {
        /// Pressure value.
        value: f64,
    },
    /// Digital port value changed.
    DigitalPortChange {
        /// Port name.
        port: String,
        /// New port value.
        value: i64,
    },
    /// The instrument lost its link to the sensor.
    LinkDown {
        /// Reason text.
        reason: String,
    },
    /// Vacuum system controller block.
    VscEvent(Fields),
    /// Degas progress block.
    DegasReading(Fields),
}

impl AsyncEvent {
    /// Kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            AsyncEvent::StartingScan { .. } => EventKind::StartingScan,
            AsyncEvent::StartingMeasurement { .. } => EventKind::StartingMeasurement,
            AsyncEvent::ZeroReading { .. } => EventKind::ZeroReading,
            AsyncEvent::MassReading { .. } => EventKind::MassReading,
            AsyncEvent::FilamentTimeRemaining { .. } => EventKind::FilamentTimeRemaining,
            AsyncEvent::MultiplierStatus(_) => EventKind::MultiplierStatus,
            AsyncEvent::RfTripState { .. } => EventKind::RfTripState,
            AsyncEvent::InletChange { .. } => EventKind::InletChange,
            AsyncEvent::AnalogInput { .. } => EventKind::AnalogInput,
            AsyncEvent::TotalPressure { .. } => EventKind::TotalPressure,
            AsyncEvent::DigitalPortChange { .. } => EventKind::DigitalPortChange,
            AsyncEvent::LinkDown { .. } => EventKind::LinkDown,
            AsyncEvent::VscEvent(_) => EventKind::VscEvent,
            AsyncEvent::DegasReading(_) => EventKind::DegasReading,
        }
    }

    /// `(mass_position, value)` for a mass reading.
    pub fn mass_reading(&self) -> Option<(i64, f64)> {
        match self {
            AsyncEvent::MassReading {
                mass_position,
                value,
            } => Some((*mass_position, *value)),
            _ => None,
        }
    }

    /// Protocol field names and values, in wire order.
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        let mut put = |name: &str, value: ScalarValue| {
            fields.insert_first(name, value);
        };
        match self {
            AsyncEvent::StartingScan {
                scan_number,
                time,
                scans_remaining,
            } => {
                put("ScanNumber", ScalarValue::Int(*scan_number));
                put("Time", ScalarValue::Str(time.clone()));
                put("ScansRemaining", ScalarValue::Int(*scans_remaining));
            }
            AsyncEvent::StartingMeasurement { name } => {
                put("MeasurementName", ScalarValue::Str(name.clone()));
            }
            AsyncEvent::ZeroReading {
                mass_position,
                value,
            }
            | AsyncEvent::MassReading {
                mass_position,
                value,
            } => {
                put("MassPosition", ScalarValue::Int(*mass_position));
                put("Value", ScalarValue::Float(*value));
            }
            AsyncEvent::FilamentTimeRemaining { time } => put("Time", ScalarValue::Float(*time)),
            AsyncEvent::RfTripState { state } => put("State", ScalarValue::Str(state.clone())),
            AsyncEvent::InletChange { index } => put("Index", ScalarValue::Int(*index)),
            AsyncEvent::AnalogInput { index, value } => {
                put("Index", ScalarValue::Int(*index));
                put("Value", ScalarValue::Float(*value));
            }
            AsyncEvent::TotalPressure { value } => put("Value", ScalarValue::Float(*value)),
            AsyncEvent::DigitalPortChange { port, value } => {
                put("Port", ScalarValue::Str(port.clone()));
                put("Value", ScalarValue::Int(*value));
            }
            AsyncEvent::LinkDown { reason } => put("Reason", ScalarValue::Str(reason.clone())),
            AsyncEvent::MultiplierStatus(block)
            | AsyncEvent::VscEvent(block)
            | AsyncEvent::DegasReading(block) => return block.clone(),
        }
        fields
    }

    /// The event as a response record named after the event.
    pub fn to_response(&self) -> Response {
        Response::new(self.kind().as_str(), self.fields())
    }
}

/// Decodes a frame read while no command reply is outstanding.
///
/// An `ERROR` status row yields the instrument error; everything else is
/// classified by its leading token.
pub fn decode_event(frame: &Frame) -> RgaResult<AsyncEvent> {
    let tokens = frame.tokens(0);
    if let [command, status, ..] = tokens.as_slice() {
        if *status == Status::ERROR_TOKEN {
            return Err(RgaError::Instrument(decode_error(
                frame,
                (*command).to_string(),
            )));
        }
    }
    classify(frame)
}

/// Maps a frame to an [`AsyncEvent`] by its leading token.
pub fn classify(frame: &Frame) -> RgaResult<AsyncEvent> {
    let tokens = frame.tokens(0);
    let token = *tokens.first().ok_or(ProtocolError::EmptyFrame)?;
    let kind = EventKind::from_token(token)
        .ok_or_else(|| ProtocolError::UnknownEvent(token.to_string()))?;
    let args = Args {
        kind,
        tokens: &tokens[1..],
    };

    let event = match kind {
        EventKind::StartingScan => AsyncEvent::StartingScan {
            scan_number: args.int(0, "ScanNumber")?,
            time: args.text(1, "Time")?,
            scans_remaining: args.int(2, "ScansRemaining")?,
        },
        EventKind::StartingMeasurement => AsyncEvent::StartingMeasurement {
            name: args.text(0, "MeasurementName")?,
        },
        EventKind::ZeroReading => AsyncEvent::ZeroReading {
            mass_position: args.int(0, "MassPosition")?,
            value: args.float(1, "Value")?,
        },
        EventKind::MassReading => AsyncEvent::MassReading {
            mass_position: args.int(0, "MassPosition")?,
            value: args.float(1, "Value")?,
        },
        EventKind::FilamentTimeRemaining => AsyncEvent::FilamentTimeRemaining {
            time: args.float(0, "Time")?,
        },
        EventKind::RfTripState => AsyncEvent::RfTripState {
            state: args.text(0, "State")?,
        },
        EventKind::InletChange => AsyncEvent::InletChange {
            index: args.int(0, "Index")?,
        },
        EventKind::AnalogInput => AsyncEvent::AnalogInput {
            index: args.int(0, "Index")?,
            value: args.float(1, "Value")?,
        },
        EventKind::TotalPressure => AsyncEvent::TotalPressure {
            value: args.float(0, "Value")?,
        },
        EventKind::DigitalPortChange => AsyncEvent::DigitalPortChange {
            port: args.text(0, "Port")?,
            value: args.int(1, "Value")?,
        },
        EventKind::LinkDown => AsyncEvent::LinkDown {
            reason: args.rest(0),
        },
        EventKind::MultiplierStatus => {
            AsyncEvent::MultiplierStatus(vertical_block(frame, kind, true))
        }
        EventKind::VscEvent => AsyncEvent::VscEvent(vertical_block(frame, kind, false)),
        EventKind::DegasReading => {
            AsyncEvent::DegasReading(vertical_block(frame, kind, true))
        }
    };
    Ok(event)
}

/// Rewrites a multi-row event as `<Event> OK` followed by its rows and parses
/// it vertically. With `keep_first_row`, the event row itself becomes a field
/// named after the event.
fn vertical_block(frame: &Frame, kind: EventKind, keep_first_row: bool) -> Fields {
    let start = if keep_first_row { 0 } else { 1 };
    let synthetic = Frame::from_rows(
        std::iter::once(format!("{} {}", kind.as_str(), Status::OK_TOKEN))
            .chain(frame.rows()[start..].iter().cloned()),
    );
    vertical_fields(&synthetic, false)
}

/// Positional arguments following the event name.
struct Args<'a> {
    kind: EventKind,
    tokens: &'a [&'a str],
}

impl Args<'_> {
    fn token(&self, pos: usize, field: &str) -> RgaResult<&str> {
        self.tokens.get(pos).copied().ok_or_else(|| {
            ProtocolError::MalformedRow {
                row: 0,
                reason: format!("{} is missing {field}", self.kind),
            }
            .into()
        })
    }

    fn int(&self, pos: usize, field: &str) -> RgaResult<i64> {
        let token = self.token(pos, field)?;
        token
            .parse()
            .map_err(|_| invalid(field, token, "integer"))
    }

    fn float(&self, pos: usize, field: &str) -> RgaResult<f64> {
        let token = self.token(pos, field)?;
        parse_float(token).ok_or_else(|| invalid(field, token, "float"))
    }

    fn text(&self, pos: usize, field: &str) -> RgaResult<String> {
        self.token(pos, field).map(str::to_string)
    }

    /// Remaining tokens from `pos` joined by single spaces; may be empty.
    fn rest(&self, pos: usize) -> String {
        self.tokens.get(pos..).unwrap_or_default().join(" ")
    }
}

fn invalid(field: &str, token: &str, expected: &'static str) -> RgaError {
    ProtocolError::InvalidField {
        field: field.to_string(),
        token: token.to_string(),
        expected,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(rows: &[&str]) -> RgaResult<AsyncEvent> {
        decode_event(&Frame::from_rows(rows.iter().copied()))
    }

    #[test]
    fn mass_reading_is_positional() {
        for (row, mass, value) in [
            ("MassReading 1 0", 1, 0.0),
            ("MassReading 28 2.3e-07", 28, 2.3e-7),
            ("MassReading 200 -1.5E+03", 200, -1500.0),
            ("MassReading 44 7", 44, 7.0),
        ] {
            let ev = event(&[row]).unwrap();
            assert_eq!(ev.kind(), EventKind::MassReading);
            assert_eq!(ev.mass_reading(), Some((mass, value)));

            let fields = ev.fields();
            assert_eq!(fields.get("MassPosition"), Some(&ScalarValue::Int(mass)));
            assert_eq!(fields.get("Value"), Some(&ScalarValue::Float(value)));
        }
    }

    #[test]
    fn mass_position_must_be_integer() {
        let err = event(&["MassReading 28.5 1.0"]).unwrap_err();
        assert!(matches!(
            err,
            RgaError::Protocol(ProtocolError::InvalidField { expected: "integer", .. })
        ));
    }

    #[test]
    fn missing_tokens_are_malformed() {
        let err = event(&["MassReading 28"]).unwrap_err();
        assert!(matches!(
            err,
            RgaError::Protocol(ProtocolError::MalformedRow { row: 0, .. })
        ));
        assert!(!err.is_unknown_event());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let err = event(&["SolarFlare 1 2"]).unwrap_err();
        assert!(err.is_unknown_event());
        match err {
            RgaError::Protocol(ProtocolError::UnknownEvent(token)) => {
                assert_eq!(token, "SolarFlare")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_status_during_drain_is_instrument_error() {
        let err = event(&["ScanResume ERROR", "Number 300", "Description Not in control"])
            .unwrap_err();
        let inst = err.as_instrument().unwrap();
        assert_eq!(inst.command, "ScanResume");
        assert_eq!(inst.code, "300");
        assert_eq!(inst.description, "Not in control");
    }

    #[test]
    fn scalar_events() {
        assert_eq!(
            event(&["StartingScan 3 7025 0"]).unwrap(),
            AsyncEvent::StartingScan {
                scan_number: 3,
                time: "7025".into(),
                scans_remaining: 0
            }
        );
        assert_eq!(
            event(&["StartingMeasurement Bar1"]).unwrap(),
            AsyncEvent::StartingMeasurement {
                name: "Bar1".into()
            }
        );
        assert_eq!(
            event(&["ZeroReading 5 1.0e-12"]).unwrap(),
            AsyncEvent::ZeroReading {
                mass_position: 5,
                value: 1.0e-12
            }
        );
        assert_eq!(
            event(&["FilamentTimeRemaining 12.5"]).unwrap(),
            AsyncEvent::FilamentTimeRemaining { time: 12.5 }
        );
        assert_eq!(
            event(&["RFTripState Tripped"]).unwrap(),
            AsyncEvent::RfTripState {
                state: "Tripped".into()
            }
        );
        assert_eq!(
            event(&["InletChange 2"]).unwrap(),
            AsyncEvent::InletChange { index: 2 }
        );
        assert_eq!(
            event(&["AnalogInput 1 4.75"]).unwrap(),
            AsyncEvent::AnalogInput {
                index: 1,
                value: 4.75
            }
        );
        assert_eq!(
            event(&["TotalPressure 1.2E-06"]).unwrap(),
            AsyncEvent::TotalPressure { value: 1.2e-6 }
        );
        assert_eq!(
            event(&["DigitalPortChange A 255"]).unwrap(),
            AsyncEvent::DigitalPortChange {
                port: "A".into(),
                value: 255
            }
        );
        assert_eq!(
            event(&["LinkDown Remote host closed"]).unwrap(),
            AsyncEvent::LinkDown {
                reason: "Remote host closed".into()
            }
        );
    }

    #[test]
    fn vertical_block_events() {
        let ev = event(&["MultiplierStatus Off", "LockedReason Filament", "Protected True"])
            .unwrap();
        assert_eq!(ev.kind(), EventKind::MultiplierStatus);
        let fields = ev.fields();
        assert_eq!(
            fields.get("MultiplierStatus"),
            Some(&ScalarValue::Str("Off".into()))
        );
        assert_eq!(
            fields.get("LockedReason"),
            Some(&ScalarValue::Str("Filament".into()))
        );
        assert_eq!(fields.get("Protected"), Some(&ScalarValue::Bool(true)));

        let vsc = event(&["VSCEvent", "Pressure 1.0e-5", "State Pumping"]).unwrap();
        assert_eq!(vsc.kind(), EventKind::VscEvent);
        assert_eq!(
            vsc.fields().names().collect::<Vec<_>>(),
            vec!["Pressure", "State"]
        );

        let degas = event(&["DegasReading 3", "Power 40"]).unwrap();
        assert_eq!(degas.to_response().get_i64("Power"), Some(40));
        assert_eq!(degas.to_response().get_i64("DegasReading"), Some(3));
    }

    #[test]
    fn event_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_token(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_token("Sensors"), None);
    }
}
