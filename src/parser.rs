use crate::point::upsert;
use crate::scan::{Ending, Scanner, KEY_SPECIAL, MEASUREMENT_SPECIAL, TAG_VALUE_TERMINATORS};
use crate::{Error, ErrorKind, FieldValue, Point};

/// Pull-based decoder for a line protocol payload.
///
/// The parser walks the payload a record at a time: blank lines and
/// `#`-prefixed comment lines are skipped, every other line is decoded into
/// a [`Point`]. A malformed line is dropped and decoding resumes on the
/// following line, so the only signal the caller ever observes is
/// exhaustion.
///
/// ```
/// use fluxline::LineProtocolParser;
///
/// let data = "# forecast feed\n\
///             weather,location=us-midwest temperature=82 1465839830100400200\n\
///             weather,location=us-midwest temperature=83 1465839830101400200";
///
/// let mut parser = LineProtocolParser::new(data);
/// while parser.has_next() {
///     let point = parser.next_point()?;
///     assert_eq!(point.measurement(), "weather");
/// }
/// # Ok::<(), fluxline::Error>(())
/// ```
///
/// The parser also implements [`Iterator`], fusing the availability check
/// and the take:
///
/// ```
/// use fluxline::LineProtocolParser;
///
/// let data = "weather temperature=82\nweather temperature=83";
/// let temperatures: Vec<_> = LineProtocolParser::new(data)
///     .map(|point| point.field("temperature").cloned())
///     .collect();
/// assert_eq!(temperatures.len(), 2);
/// ```
#[derive(Debug)]
pub struct LineProtocolParser<'a> {
    scanner: Scanner<'a>,
    strict: bool,
    lookahead: Lookahead,
}

/// The scan-ahead state: nothing cached yet, a decoded point pending, or
/// the input known to hold no further points.
#[derive(Debug)]
enum Lookahead {
    Unscanned,
    Pending(Point),
    Exhausted,
}

/// Configures a parser before handing it a payload
///
/// ```
/// use fluxline::LineProtocolParser;
///
/// let parser = LineProtocolParser::builder()
///     .strict(true)
///     .build("weather temperature=\"82\"x 1465839830100400200");
/// assert_eq!(parser.count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct LineProtocolParserBuilder {
    strict: bool,
}

impl LineProtocolParserBuilder {
    pub fn new() -> LineProtocolParserBuilder {
        LineProtocolParserBuilder::default()
    }

    /// In strict mode, content trailing a closing quote drops the whole
    /// line instead of only the remainder of the line.
    pub fn strict(mut self, strict: bool) -> LineProtocolParserBuilder {
        self.strict = strict;
        self
    }

    pub fn build(self, data: &str) -> LineProtocolParser {
        LineProtocolParser {
            scanner: Scanner::new(data),
            strict: self.strict,
            lookahead: Lookahead::Unscanned,
        }
    }
}

impl<'a> LineProtocolParser<'a> {
    /// Creates a lenient parser over the given payload
    pub fn new(data: &'a str) -> LineProtocolParser<'a> {
        LineProtocolParser::builder().build(data)
    }

    /// Returns a builder to customize parser behavior
    pub fn builder() -> LineProtocolParserBuilder {
        LineProtocolParserBuilder::new()
    }

    /// Returns true when another point can be decoded, scanning ahead and
    /// caching it if necessary.
    pub fn has_next(&mut self) -> bool {
        if let Lookahead::Unscanned = self.lookahead {
            self.lookahead = match self.scan_next() {
                Some(point) => Lookahead::Pending(point),
                None => Lookahead::Exhausted,
            };
        }

        matches!(self.lookahead, Lookahead::Pending(_))
    }

    /// Takes the point cached by [`has_next`](Self::has_next).
    ///
    /// Consuming without a prior availability check reports
    /// [`ErrorKind::Exhausted`]; the take never scans ahead on its own.
    pub fn next_point(&mut self) -> Result<Point, Error> {
        match std::mem::replace(&mut self.lookahead, Lookahead::Unscanned) {
            Lookahead::Pending(point) => Ok(point),
            Lookahead::Exhausted => {
                self.lookahead = Lookahead::Exhausted;
                Err(Error::new(ErrorKind::Exhausted))
            }
            Lookahead::Unscanned => Err(Error::new(ErrorKind::Exhausted)),
        }
    }

    /// Scans forward until a line decodes or the input runs out.
    fn scan_next(&mut self) -> Option<Point> {
        loop {
            self.skip_interstitial();
            if self.scanner.at_end() {
                return None;
            }

            match self.decode_record() {
                Ok(point) => return Some(point),
                // The offending line is dropped from wherever the failed
                // scan stopped; a scan that consumed its newline swallows
                // the remainder text with it.
                Err(_) => self.scanner.skip_line(),
            }
        }
    }

    /// Skips blank lines, comment lines, and leading whitespace.
    fn skip_interstitial(&mut self) {
        loop {
            self.scanner.skip_horizontal_whitespace();
            if self.scanner.take_newline() {
                continue;
            }
            if self.scanner.peek() == Some(b'#') {
                self.scanner.skip_line();
                continue;
            }
            return;
        }
    }

    /// Decodes one record with the cursor on its first character.
    fn decode_record(&mut self) -> Result<Point, Error> {
        let (measurement, end) = self.scanner.ident(MEASUREMENT_SPECIAL, MEASUREMENT_SPECIAL);
        let section = match end {
            Ending::Delimiter(d) => d,
            Ending::Newline => {
                return Err(Error::new(ErrorKind::UnexpectedNewline {
                    offset: self.scanner.pos(),
                }))
            }
            Ending::Eof => return Err(Error::new(ErrorKind::Eof)),
        };
        if measurement.is_empty() {
            return Err(Error::new(ErrorKind::EmptyMeasurement));
        }

        let mut tags = Vec::new();
        if section == b',' {
            self.decode_tags(&mut tags)?;
        }

        self.scanner.skip_spaces();

        let mut fields = Vec::new();
        let line_done = self.decode_fields(&mut fields)?;

        let mut timestamp = None;
        if !line_done {
            self.scanner.skip_spaces();
            let offset = self.scanner.pos();
            let rest = self.scanner.rest_of_line().trim();
            if !rest.is_empty() {
                timestamp = Some(
                    rest.parse::<i64>()
                        .map_err(|_| Error::new(ErrorKind::InvalidTimestamp { offset }))?,
                );
            }
        }

        Ok(Point::new(measurement, tags, fields, timestamp))
    }

    /// Decodes `key=value` tag pairs until a space hands over to the field
    /// section.
    fn decode_tags(&mut self, tags: &mut Vec<(String, String)>) -> Result<(), Error> {
        loop {
            let key_offset = self.scanner.pos();
            let (key, end) = self.scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
            self.require_separator(end)?;
            if key.is_empty() {
                return Err(Error::new(ErrorKind::EmptyTagKey { offset: key_offset }));
            }

            let value_offset = self.scanner.pos();
            let (value, end) = self.scanner.ident(KEY_SPECIAL, TAG_VALUE_TERMINATORS);
            let next = match end {
                Ending::Delimiter(d) => d,
                Ending::Newline => {
                    return Err(Error::new(ErrorKind::UnexpectedNewline {
                        offset: self.scanner.pos(),
                    }))
                }
                Ending::Eof => return Err(Error::new(ErrorKind::Eof)),
            };
            if value.is_empty() {
                return Err(Error::new(ErrorKind::EmptyTagValue {
                    offset: value_offset,
                }));
            }

            upsert(tags, key, value);
            if next == b' ' {
                return Ok(());
            }
        }
    }

    /// Decodes the field section. Returns true when the scan already
    /// consumed the line terminator, leaving no room for a timestamp.
    fn decode_fields(&mut self, fields: &mut Vec<(String, FieldValue)>) -> Result<bool, Error> {
        loop {
            let key_offset = self.scanner.pos();
            let (key, end) = self.scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
            self.require_separator(end)?;
            if key.is_empty() {
                return Err(Error::new(ErrorKind::EmptyFieldKey { offset: key_offset }));
            }

            if self.scanner.peek() == Some(b'"') {
                let value = self.scanner.quoted()?;
                upsert(fields, key, FieldValue::String(value));

                // Only a space, newline, or end of input may follow the
                // closing quote.
                if self.scanner.at_end() || self.scanner.take_newline() {
                    return Ok(true);
                }
                if self.scanner.peek() == Some(b' ') {
                    return Ok(false);
                }
                if self.strict {
                    return Err(Error::new(ErrorKind::TrailingContent {
                        offset: self.scanner.pos(),
                    }));
                }

                // Lenient: the point keeps what decoded so far and the
                // remainder of the line is dropped, timestamp included.
                self.scanner.skip_line();
                return Ok(true);
            }

            let (literal, end) = self.scanner.raw_literal();
            let value = FieldValue::from_literal(literal)?;
            upsert(fields, key, value);
            match end {
                Ending::Delimiter(b',') => continue,
                Ending::Delimiter(_) => return Ok(false),
                Ending::Newline | Ending::Eof => return Ok(true),
            }
        }
    }

    fn require_separator(&self, end: Ending) -> Result<(), Error> {
        match end {
            Ending::Delimiter(b'=') => Ok(()),
            Ending::Delimiter(_) => Err(Error::new(ErrorKind::MissingSeparator {
                offset: self.scanner.pos(),
            })),
            Ending::Newline => Err(Error::new(ErrorKind::UnexpectedNewline {
                offset: self.scanner.pos(),
            })),
            Ending::Eof => Err(Error::new(ErrorKind::Eof)),
        }
    }
}

impl<'a> Iterator for LineProtocolParser<'a> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.has_next() {
            self.next_point().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_before_availability_check_is_misuse() {
        let mut parser = LineProtocolParser::new("weather temperature=82");
        let err = parser.next_point().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Exhausted));
    }

    #[test]
    fn exhaustion_is_sticky() {
        let mut parser = LineProtocolParser::new("");
        assert!(!parser.has_next());
        assert!(parser.next_point().is_err());
        assert!(!parser.has_next());
        assert!(parser.next_point().is_err());
    }

    #[test]
    fn availability_check_is_idempotent() {
        let mut parser = LineProtocolParser::new("weather temperature=82");
        assert!(parser.has_next());
        assert!(parser.has_next());
        assert_eq!(parser.next_point().unwrap().measurement(), "weather");
        assert!(!parser.has_next());
    }

    #[test]
    fn interior_bad_line_is_skipped() {
        let data = "weather temperature=82\n\
                    weather temperature=not-a-number\n\
                    weather temperature=84";
        let temps: Vec<_> = LineProtocolParser::new(data)
            .map(|p| p.field("temperature").unwrap().as_float().unwrap())
            .collect();
        assert_eq!(temps, vec![82.0, 84.0]);
    }

    #[test]
    fn crlf_line_endings() {
        let data = "weather temperature=82\r\nweather temperature=83\r\n";
        let points: Vec<_> = LineProtocolParser::new(data).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points[1].field("temperature"),
            Some(&FieldValue::Float(83.0))
        );
    }

    #[test]
    fn duplicate_wire_keys_last_write_wins() {
        let mut parser = LineProtocolParser::new("weather,a=1,a=2 f=1,f=2i");
        assert!(parser.has_next());
        let point = parser.next_point().unwrap();
        assert_eq!(point.tag("a"), Some("2"));
        assert_eq!(point.fields(), &[("f".to_string(), FieldValue::Integer(2))]);
    }
}
