//! Status row inspection.
//!
//! Every reply starts with `<CommandName> <Status>`. An `ERROR` reply carries
//! the code on the second row (`<label> <code>`) and a free-text description
//! on the third:
//!
//! ```text
//! Select ERROR
//! Number 200
//! Description Sensor not found
//! ```

use super::codec::Frame;
use super::response::Status;
use crate::error::{InstrumentError, ProtocolError, RgaError, RgaResult};

/// Label that precedes the description text on the third row of an error reply.
const DESCRIPTION_LABEL: &str = "Description";

/// Splits the first row into command name and status.
pub fn status_line(frame: &Frame) -> RgaResult<(String, Status)> {
    let tokens = frame.tokens(0);
    let command = tokens.first().ok_or(ProtocolError::EmptyFrame)?;
    let token = tokens.get(1).copied().unwrap_or_default();
    let status = Status::from_token(token).ok_or_else(|| ProtocolError::UnexpectedStatus {
        command: (*command).to_string(),
        token: token.to_string(),
    })?;
    Ok(((*command).to_string(), status))
}

/// Validates the status row.
///
/// Returns the command name for an `OK` reply and the decoded
/// [`InstrumentError`] for an `ERROR` reply.
pub fn check_status(frame: &Frame) -> RgaResult<String> {
    match status_line(frame)? {
        (command, Status::Ok) => Ok(command),
        (command, Status::Error) => Err(RgaError::Instrument(decode_error(frame, command))),
    }
}

/// Reads code and description from an `ERROR` reply. Missing rows decode as empty strings.
pub fn decode_error(frame: &Frame, command: String) -> InstrumentError {
    let code_row = frame.tokens(1);
    let code = match code_row.as_slice() {
        [_, code, ..] => (*code).to_string(),
        [code] => (*code).to_string(),
        [] => String::new(),
    };

    let mut description = frame.tokens(2);
    if description.len() > 1 && description[0].eq_ignore_ascii_case(DESCRIPTION_LABEL) {
        description.remove(0);
    }

    InstrumentError {
        command,
        code,
        description: description.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reply_yields_command_name() {
        let frame = Frame::from_rows(["Release OK"]);
        assert_eq!(check_status(&frame).unwrap(), "Release");
    }

    #[test]
    fn error_reply_decodes_code_and_description() {
        let frame = Frame::from_rows(["Select ERROR", "CODE 12", "bad serial"]);
        let err = check_status(&frame).unwrap_err();
        let inst = err.as_instrument().unwrap();
        assert_eq!(inst.command, "Select");
        assert_eq!(inst.code, "12");
        assert_eq!(inst.description, "bad serial");
    }

    #[test]
    fn labelled_description_is_stripped_and_rejoined() {
        let frame = Frame::from_rows([
            "Control ERROR",
            "Number   201",
            "Description   Sensor  already   in use",
        ]);
        let err = check_status(&frame).unwrap_err();
        let inst = err.as_instrument().unwrap();
        assert_eq!(inst.code, "201");
        assert_eq!(inst.description, "Sensor already in use");
    }

    #[test]
    fn unknown_status_token_is_protocol_error() {
        let frame = Frame::from_rows(["Info MAYBE"]);
        match check_status(&frame).unwrap_err() {
            RgaError::Protocol(ProtocolError::UnexpectedStatus { command, token }) => {
                assert_eq!(command, "Info");
                assert_eq!(token, "MAYBE");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_status_token_is_protocol_error() {
        let frame = Frame::from_rows(["Info"]);
        assert!(matches!(
            check_status(&frame),
            Err(RgaError::Protocol(ProtocolError::UnexpectedStatus { .. }))
        ));
        assert!(matches!(
            check_status(&Frame::default()),
            Err(RgaError::Protocol(ProtocolError::EmptyFrame))
        ));
    }

    #[test]
    fn truncated_error_reply_decodes_empty_fields() {
        let frame = Frame::from_rows(["Select ERROR"]);
        let inst = decode_error(&frame, "Select".into());
        assert_eq!(inst.code, "");
        assert_eq!(inst.description, "");
    }
}
