//! Tabular reply decoding.
//!
//! The wire format does not describe its own layout, so the caller picks a
//! [`Layout`] from the command it issued:
//!
//! ```text
//! Horizontal                 Vertical                 Vertical, one value per line
//! ----------                 --------                 ----------------------------
//! InletInfo OK               SensorState OK           EGains OK
//! Index Factor  Fixed        State  InUse             1
//! 0     1.0     True         UserApplication  Recorder 100
//! 1     0.8     False        UserVersion      1.0     20000
//! ```
//!
//! Horizontal data rows after the first get their zero-based offset appended to
//! each header (`Index`, `Factor`, ..., `Index1`, `Factor1`, ...). Composite
//! replies such as `DetectorInfo` carry one vertical row followed by a table.

use super::codec::Frame;
use super::response::{Fields, Response};
use super::status::check_status;
use super::value::ScalarValue;
use crate::error::{ProtocolError, RgaResult};
use tracing::warn;

/// Row layout of an `OK` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Header row followed by one data row per index.
    Horizontal,
    /// One `<Name> <Value>` pair per row.
    Vertical,
    /// One bare value per row, named `Value<row>`.
    VerticalOnePerLine,
    /// A single vertical row followed by a horizontal table.
    Composite,
}

/// Checks the status row and decodes the remaining rows with `layout`.
pub fn parse_response(frame: &Frame, layout: Layout) -> RgaResult<Response> {
    let command = check_status(frame)?;
    let fields = match layout {
        Layout::Horizontal => horizontal_fields(frame)?,
        Layout::Vertical => vertical_fields(frame, false),
        Layout::VerticalOnePerLine => vertical_fields(frame, true),
        Layout::Composite => composite_fields(frame)?,
    };
    Ok(Response::new(command, fields))
}

/// Decodes a horizontal table. Row 1 holds the headers, rows 2.. the values.
pub fn horizontal_fields(frame: &Frame) -> RgaResult<Fields> {
    let headers = frame.tokens(1);
    let mut fields = Fields::new();

    for row in 2..frame.len() {
        let values = frame.tokens(row);
        if values.len() < headers.len() {
            return Err(ProtocolError::MalformedRow {
                row,
                reason: format!(
                    "expected {} values, found {}",
                    headers.len(),
                    values.len()
                ),
            }
            .into());
        }

        let offset = row - 2;
        for (header, value) in headers.iter().zip(values) {
            let name = if offset == 0 {
                (*header).to_string()
            } else {
                format!("{header}{offset}")
            };
            if !fields.insert_first(name, ScalarValue::infer(value)) {
                warn!(header, row, "duplicate field in horizontal reply ignored");
            }
        }
    }

    Ok(fields)
}

/// Decodes name/value rows starting at row 1.
///
/// With `one_per_line`, each row is a bare value named `Value<row>`. Blank
/// rows are skipped; a name without a value decodes as an empty string.
pub fn vertical_fields(frame: &Frame, one_per_line: bool) -> Fields {
    let mut fields = Fields::new();

    for (row, line) in frame.rows().iter().enumerate().skip(1) {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };

        let (name, value) = if one_per_line {
            (format!("Value{row}"), line.trim().to_string())
        } else {
            (first.to_string(), tokens.collect::<Vec<_>>().join(" "))
        };

        if !fields.insert_first(name, ScalarValue::infer(&value)) {
            warn!(field = first, row, "duplicate field in vertical reply ignored");
        }
    }

    fields
}

/// Decodes row 1 vertically and rows 2.. as a table headed by row 2.
///
/// Both halves share the status row. Vertical fields win on name collisions.
pub fn composite_fields(frame: &Frame) -> RgaResult<Fields> {
    let vertical = frame.select_rows([0, 1]);
    let table = frame.select_rows(std::iter::once(0).chain(2..frame.len()));

    let mut fields = vertical_fields(&vertical, false);
    fields.merge_missing(horizontal_fields(&table)?);
    Ok(fields)
}
