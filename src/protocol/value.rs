//! Scalar field values and best-effort inference.

use serde::Serialize;
use std::fmt;

/// A decoded field value.
///
/// Tokens are typed by [`ScalarValue::infer`], which tries integer, float,
/// boolean and finally falls back to the raw string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Integer token.
    Int(i64),
    /// Decimal or scientific float.
    Float(f64),
    /// One of the accepted boolean spellings.
    Bool(bool),
    /// Anything else, verbatim.
    Str(String),
}

/// Boolean spellings accepted during inference.
const TRUE_LEXEMES: &[&str] = &["1", "t", "T", "TRUE", "true", "True"];
const FALSE_LEXEMES: &[&str] = &["0", "f", "F", "FALSE", "false", "False"];

impl ScalarValue {
    /// Types a bare token. The first parse that succeeds wins.
    pub fn infer(token: &str) -> Self {
        if let Ok(v) = token.parse::<i64>() {
            return ScalarValue::Int(v);
        }
        if let Some(v) = parse_float(token) {
            return ScalarValue::Float(v);
        }
        if let Some(v) = parse_bool(token) {
            return ScalarValue::Bool(v);
        }
        ScalarValue::Str(token.to_string())
    }

    /// Integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String view; only for [`ScalarValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Int(_) => "integer",
            ScalarValue::Float(_) => "float",
            ScalarValue::Bool(_) => "boolean",
            ScalarValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Str(v) => f.write_str(v),
        }
    }
}

/// Decimal or scientific notation; `inf` and `NaN` spellings are accepted.
pub(crate) fn parse_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok()
}

pub(crate) fn parse_bool(token: &str) -> Option<bool> {
    if TRUE_LEXEMES.contains(&token) {
        Some(true)
    } else if FALSE_LEXEMES.contains(&token) {
        Some(false)
    } else {
        None
    }
}

/// Renders a boolean argument the way the instrument expects it.
pub fn bool_word(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
