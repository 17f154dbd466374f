//! Decoded reply records.

use super::value::ScalarValue;
use serde::Serialize;
use std::fmt;

/// Status token carried on the first row of every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    /// Command accepted.
    Ok,
    /// Command rejected; the remaining rows describe why.
    Error,
}

impl Status {
    /// Wire token of [`Status::Ok`].
    pub const OK_TOKEN: &'static str = "OK";
    /// Wire token of [`Status::Error`].
    pub const ERROR_TOKEN: &'static str = "ERROR";

    /// Parses a status token, case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            Self::OK_TOKEN => Some(Status::Ok),
            Self::ERROR_TOKEN => Some(Status::Error),
            _ => None,
        }
    }

    /// Wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => Self::OK_TOKEN,
            Status::Error => Self::ERROR_TOKEN,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Insertion-ordered field map. The first value inserted under a name is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fields {
    entries: Vec<(String, ScalarValue)>,
}

impl Fields {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` unless `name` is already present.
    ///
    /// Returns `false` when the field was a duplicate and has been ignored.
    pub fn insert_first(&mut self, name: impl Into<String>, value: ScalarValue) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value));
        true
    }

    /// Merges `other` into `self`, keeping existing entries on collision.
    pub fn merge_missing(&mut self, other: Fields) {
        for (name, value) in other.entries {
            self.insert_first(name, value);
        }
    }

    /// Value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no field was decoded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a str, &'a ScalarValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// A successful (`OK`) reply decoded into typed fields.
///
/// Error replies never produce a `Response`; they surface as
/// [`InstrumentError`](crate::error::InstrumentError) instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Command (or event) name from the first row.
    pub command: String,
    /// Always [`Status::Ok`].
    pub status: Status,
    /// Decoded fields.
    pub fields: Fields,
}

impl Response {
    /// Successful reply for `command`.
    pub fn new(command: impl Into<String>, fields: Fields) -> Self {
        Self {
            command: command.into(),
            status: Status::Ok,
            fields,
        }
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.fields.get(name)
    }

    /// Integer field.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ScalarValue::as_i64)
    }

    /// Numeric field; integers widen.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ScalarValue::as_f64)
    }

    /// Boolean field.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ScalarValue::as_bool)
    }

    /// String view of a field; non-string values are rendered.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }

    /// One `"<Field> <Value>"` line per field, in decode order.
    pub fn to_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(name, value)| format!("{name} {value}"))
            .collect()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.command, self.status)?;
        for (name, value) in &self.fields {
            writeln!(f, "{name} {value}")?;
        }
        Ok(())
    }
}
