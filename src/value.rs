use crate::scan::escape_quoted;
use std::error;
use std::fmt;

/// An error that can occur when decoding a field value literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The literal carried the `i` suffix but the body was not an integer
    InvalidInteger(String),

    /// The literal was not a number, boolean, or quoted string
    InvalidFloat(String),
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueError::InvalidInteger(x) => write!(f, "is not a valid integer: {}", x),
            ValueError::InvalidFloat(x) => write!(f, "is not a valid float: {}", x),
        }
    }
}

impl error::Error for ValueError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        None
    }
}

/// A single decoded field value.
///
/// The line protocol encodes four kinds of scalars. A bare numeric literal
/// decodes as a float, an `i`-suffixed literal as an integer, `true`/`t` and
/// `false`/`f` (any casing) as booleans, and a double-quoted literal as a
/// string.
///
/// ```
/// use fluxline::FieldValue;
///
/// assert_eq!(FieldValue::from_literal("82"), Ok(FieldValue::Float(82.0)));
/// assert_eq!(FieldValue::from_literal("82i"), Ok(FieldValue::Integer(82)));
/// assert_eq!(FieldValue::from_literal("T"), Ok(FieldValue::Boolean(true)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// A 64-bit float, the default numeric encoding
    Float(f64),

    /// A 64-bit signed integer, encoded with a trailing `i`
    Integer(i64),

    /// A boolean
    Boolean(bool),

    /// A string, encoded double-quoted
    String(String),
}

impl FieldValue {
    /// Decode an unquoted value literal.
    ///
    /// Quoted strings never reach this function; the parser scans them with
    /// their own escaping rules and wraps the content in
    /// [`FieldValue::String`] directly.
    pub fn from_literal(raw: &str) -> Result<FieldValue, ValueError> {
        // A lone `i` yields an empty body, which the integer parse rejects,
        // so the literal `i` drops the line rather than decoding as anything.
        if let Some(body) = raw.strip_suffix('i') {
            return body
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| ValueError::InvalidInteger(raw.to_string()));
        }

        if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("t") {
            return Ok(FieldValue::Boolean(true));
        }

        if raw.eq_ignore_ascii_case("false") || raw.eq_ignore_ascii_case("f") {
            return Ok(FieldValue::Boolean(false));
        }

        // `str::parse` admits inf and NaN spellings the wire format has no
        // canonical form for, so only finite floats decode
        match raw.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(FieldValue::Float(x)),
            _ => Err(ValueError::InvalidFloat(raw.to_string())),
        }
    }

    /// Returns the float content, if this value is a float
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            FieldValue::Float(x) => Some(x),
            _ => None,
        }
    }

    /// Returns the integer content, if this value is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            FieldValue::Integer(x) => Some(x),
            _ => None,
        }
    }

    /// Returns the boolean content, if this value is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match *self {
            FieldValue::Boolean(x) => Some(x),
            _ => None,
        }
    }

    /// Returns the string content, if this value is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(x) => Some(x),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Integer(x) => {
                write_i64(f, *x)?;
                f.write_str("i")
            }
            FieldValue::Boolean(true) => f.write_str("true"),
            FieldValue::Boolean(false) => f.write_str("false"),
            FieldValue::String(x) => {
                f.write_str("\"")?;
                f.write_str(&escape_quoted(x))?;
                f.write_str("\"")
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<i64> for FieldValue {
    fn from(x: i64) -> Self {
        FieldValue::Integer(x)
    }
}

impl From<bool> for FieldValue {
    fn from(x: bool) -> Self {
        FieldValue::Boolean(x)
    }
}

impl From<String> for FieldValue {
    fn from(x: String) -> Self {
        FieldValue::String(x)
    }
}

impl From<&str> for FieldValue {
    fn from(x: &str) -> Self {
        FieldValue::String(x.to_string())
    }
}

#[cfg(feature = "faster_writer")]
pub(crate) fn write_i64(f: &mut fmt::Formatter, x: i64) -> fmt::Result {
    let mut buffer = itoa::Buffer::new();
    f.write_str(buffer.format(x))
}

#[cfg(not(feature = "faster_writer"))]
pub(crate) fn write_i64(f: &mut fmt::Formatter, x: i64) -> fmt::Result {
    write!(f, "{}", x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("82", FieldValue::Float(82.0))]
    #[case("-82.5", FieldValue::Float(-82.5))]
    #[case("0.504", FieldValue::Float(0.504))]
    #[case("82i", FieldValue::Integer(82))]
    #[case("-82i", FieldValue::Integer(-82))]
    #[case("true", FieldValue::Boolean(true))]
    #[case("TRUE", FieldValue::Boolean(true))]
    #[case("t", FieldValue::Boolean(true))]
    #[case("false", FieldValue::Boolean(false))]
    #[case("F", FieldValue::Boolean(false))]
    fn literal_decoding(#[case] input: &str, #[case] expected: FieldValue) {
        assert_eq!(FieldValue::from_literal(input), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("i")]
    #[case("82.5i")]
    #[case("yes")]
    #[case("truthy")]
    #[case("82f")]
    #[case("NaN")]
    #[case("inf")]
    #[case("1e999")]
    fn literal_rejections(#[case] input: &str) {
        assert!(FieldValue::from_literal(input).is_err());
    }

    #[test]
    fn integer_suffix_requires_numeric_body() {
        assert_eq!(
            FieldValue::from_literal("8x2i"),
            Err(ValueError::InvalidInteger(String::from("8x2i")))
        );
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(FieldValue::Float(82.0).to_string(), "82");
        assert_eq!(FieldValue::Float(-1.5).to_string(), "-1.5");
        assert_eq!(FieldValue::Integer(82).to_string(), "82i");
        assert_eq!(FieldValue::Boolean(true).to_string(), "true");
        assert_eq!(
            FieldValue::String(String::from("8\"2")).to_string(),
            "\"8\\\"2\""
        );
        assert_eq!(
            FieldValue::String(String::from("8\\")).to_string(),
            "\"8\\\\\""
        );
    }
}
