use crate::scan::{escape, KEY_SPECIAL, MEASUREMENT_SPECIAL};
use crate::value::write_i64;
use crate::{Error, ErrorKind, FieldValue};
use std::fmt;

/// One decoded metric point.
///
/// A point is produced atomically by the parser and immutable afterwards:
/// a measurement name, tags and fields in wire order with unique keys, and
/// an optional nanosecond-epoch timestamp.
///
/// Its `Display` implementation is the canonical serialization, a line
/// protocol compliant line that re-decodes to an equal point:
///
/// ```
/// use fluxline::Point;
///
/// let point = Point::builder("weather")
///     .tag("location", "us-midwest")
///     .field("temperature", 82.0)
///     .timestamp(1465839830100400200)
///     .build()?;
///
/// assert_eq!(
///     point.to_string(),
///     "weather,location=us-midwest temperature=82 1465839830100400200"
/// );
/// # Ok::<(), fluxline::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<i64>,
}

impl Point {
    pub(crate) fn new(
        measurement: String,
        tags: Vec<(String, String)>,
        fields: Vec<(String, FieldValue)>,
        timestamp: Option<i64>,
    ) -> Point {
        Point {
            measurement,
            tags,
            fields,
            timestamp,
        }
    }

    /// Starts building a point programmatically
    pub fn builder<S>(measurement: S) -> PointBuilder
    where
        S: Into<String>,
    {
        PointBuilder {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// The measurement name the point belongs to
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// The tag set in wire order
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// The field set in wire order, never empty
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// The nanosecond epoch timestamp, when the line carried one
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Looks up a tag value by key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up a field value by key
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&escape(&self.measurement, MEASUREMENT_SPECIAL))?;

        for (key, value) in &self.tags {
            f.write_str(",")?;
            f.write_str(&escape(key, KEY_SPECIAL))?;
            f.write_str("=")?;
            f.write_str(&escape(value, KEY_SPECIAL))?;
        }

        for (i, (key, value)) in self.fields.iter().enumerate() {
            f.write_str(if i == 0 { " " } else { "," })?;
            f.write_str(&escape(key, KEY_SPECIAL))?;
            f.write_str("=")?;
            write!(f, "{}", value)?;
        }

        if let Some(timestamp) = self.timestamp {
            f.write_str(" ")?;
            write_i64(f, timestamp)?;
        }

        Ok(())
    }
}

/// Replaces the value of an existing key or appends a new entry, preserving
/// first-insertion order
pub(crate) fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// Constructs a [`Point`] outside of parsing, validating the same
/// invariants the wire format imposes.
///
/// ```
/// use fluxline::{FieldValue, Point};
///
/// let point = Point::builder("weather")
///     .field("temperature", 82i64)
///     .field("summary", "mild")
///     .build()?;
///
/// assert_eq!(point.field("temperature"), Some(&FieldValue::Integer(82)));
/// # Ok::<(), fluxline::Error>(())
/// ```
#[derive(Debug)]
pub struct PointBuilder {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<i64>,
}

impl PointBuilder {
    /// Adds a tag, replacing any earlier value under the same key
    pub fn tag<K, V>(mut self, key: K, value: V) -> PointBuilder
    where
        K: Into<String>,
        V: Into<String>,
    {
        upsert(&mut self.tags, key.into(), value.into());
        self
    }

    /// Adds a field, replacing any earlier value under the same key
    pub fn field<K, V>(mut self, key: K, value: V) -> PointBuilder
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        upsert(&mut self.fields, key.into(), value.into());
        self
    }

    /// Sets the timestamp
    pub fn timestamp(mut self, timestamp: i64) -> PointBuilder {
        self.timestamp = Some(timestamp);
        self
    }

    /// Validates and produces the point
    pub fn build(self) -> Result<Point, Error> {
        if self.measurement.is_empty() {
            return Err(Error::new(ErrorKind::EmptyMeasurement));
        }

        if self.fields.is_empty() {
            return Err(Error::new(ErrorKind::MissingFields));
        }

        Ok(Point {
            measurement: self.measurement,
            tags: self.tags,
            fields: self.fields,
            timestamp: self.timestamp,
        })
    }
}
