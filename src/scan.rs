use crate::{Error, ErrorKind};
use std::borrow::Cow;

/// Characters that terminate (and are escapable within) a measurement name.
pub(crate) const MEASUREMENT_SPECIAL: &[u8] = b", ";

/// Characters that are escapable within tag keys, tag values, and field keys.
///
/// Escaping is contextual: a backslash collapses only when the following
/// character belongs to the current set. In particular `\\` is never an
/// escape pair in identifier position, so a backslash always decodes to
/// itself.
pub(crate) const KEY_SPECIAL: &[u8] = b",= ";

/// Terminators for a tag value. `=` is escapable in a tag value but legal
/// unescaped, so it is excluded here.
pub(crate) const TAG_VALUE_TERMINATORS: &[u8] = b", ";

/// How a token scan stopped.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Ending {
    /// An unescaped terminator, which has been consumed
    Delimiter(u8),

    /// A newline (`\n` or `\r\n`), which has been consumed
    Newline,

    /// The end of the input
    Eof,
}

/// Cursor over an immutable input buffer.
///
/// All protocol structure is ASCII, so scanning positions are byte indices;
/// multi-byte characters can never collide with a delimiter and pass through
/// untouched.
#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Scanner<'a> {
        Scanner { input, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Consumes a `\n` or `\r\n` if the cursor sits on one.
    pub(crate) fn take_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    pub(crate) fn skip_horizontal_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    /// Discards everything up to and including the next newline.
    pub(crate) fn skip_line(&mut self) {
        match memchr::memchr(b'\n', &self.input.as_bytes()[self.pos..]) {
            Some(idx) => self.pos += idx + 1,
            None => self.pos = self.input.len(),
        }
    }

    /// Consumes the rest of the line, returning it without its newline.
    pub(crate) fn rest_of_line(&mut self) -> &'a str {
        let rest = &self.input[self.pos..];
        match memchr::memchr(b'\n', rest.as_bytes()) {
            Some(idx) => {
                self.pos += idx + 1;
                &rest[..idx]
            }
            None => {
                self.pos = self.input.len();
                rest
            }
        }
    }

    /// Scans an identifier token (measurement, tag key, tag value, or field
    /// key) up to an unescaped terminator, applying the contextual escape
    /// rule over `special`.
    ///
    /// The terminator is consumed but not included in the token. A newline is
    /// consumed as well so that error recovery resumes on the following line.
    pub(crate) fn ident(&mut self, special: &[u8], terminators: &[u8]) -> (String, Ending) {
        let bytes = self.input.as_bytes();
        let mut out = String::new();
        let mut chunk = self.pos;
        loop {
            match bytes.get(self.pos) {
                None => {
                    out.push_str(&self.input[chunk..self.pos]);
                    return (out, Ending::Eof);
                }
                Some(&b'\\') if self.peek_at(1).map_or(false, |c| special.contains(&c)) => {
                    out.push_str(&self.input[chunk..self.pos]);
                    out.push(bytes[self.pos + 1] as char);
                    self.pos += 2;
                    chunk = self.pos;
                }
                Some(&b) if terminators.contains(&b) => {
                    out.push_str(&self.input[chunk..self.pos]);
                    self.pos += 1;
                    return (out, Ending::Delimiter(b));
                }
                Some(&b'\n') => {
                    out.push_str(&self.input[chunk..self.pos]);
                    self.pos += 1;
                    return (out, Ending::Newline);
                }
                Some(&b'\r') if self.peek_at(1) == Some(b'\n') => {
                    out.push_str(&self.input[chunk..self.pos]);
                    self.pos += 2;
                    return (out, Ending::Newline);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scans an unquoted field value literal. No escape processing applies;
    /// the literal runs to the first comma, space, newline, or end of input.
    pub(crate) fn raw_literal(&mut self) -> (&'a str, Ending) {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        loop {
            match bytes.get(self.pos) {
                None => return (&self.input[start..self.pos], Ending::Eof),
                Some(&b) if b == b',' || b == b' ' => {
                    let literal = &self.input[start..self.pos];
                    self.pos += 1;
                    return (literal, Ending::Delimiter(b));
                }
                Some(&b'\n') => {
                    let literal = &self.input[start..self.pos];
                    self.pos += 1;
                    return (literal, Ending::Newline);
                }
                Some(&b'\r') if self.peek_at(1) == Some(b'\n') => {
                    let literal = &self.input[start..self.pos];
                    self.pos += 2;
                    return (literal, Ending::Newline);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scans a double-quoted field value with the cursor on the opening
    /// quote. Recognizes exactly two escape pairs (`\\` and `\"`); any other
    /// backslash passes through literally. Newlines are legal content.
    ///
    /// On success the cursor rests just past the closing quote; the caller
    /// decides what may legally follow.
    pub(crate) fn quoted(&mut self) -> Result<String, Error> {
        let bytes = self.input.as_bytes();
        debug_assert_eq!(bytes.get(self.pos), Some(&b'"'));
        self.pos += 1;
        let mut out = String::new();
        let mut chunk = self.pos;
        loop {
            match bytes.get(self.pos) {
                None => {
                    return Err(Error::new(ErrorKind::UnterminatedString { offset: self.pos }))
                }
                Some(&b'\\') => match self.peek_at(1) {
                    Some(c) if c == b'\\' || c == b'"' => {
                        out.push_str(&self.input[chunk..self.pos]);
                        out.push(c as char);
                        self.pos += 2;
                        chunk = self.pos;
                    }
                    _ => self.pos += 1,
                },
                Some(&b'"') => {
                    out.push_str(&self.input[chunk..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                _ => self.pos += 1,
            }
        }
    }
}

/// Escapes an identifier for canonical serialization: each character in
/// `special` gains a backslash prefix. Backslashes are written as-is; under
/// the contextual escape rule they re-decode to themselves.
pub(crate) fn escape<'a>(s: &'a str, special: &[u8]) -> Cow<'a, str> {
    if !s.bytes().any(|b| special.contains(&b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if c.is_ascii() && special.contains(&(c as u8)) {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Escapes a string field value for canonical serialization: backslashes and
/// double quotes gain a backslash prefix.
pub(crate) fn escape_quoted(s: &str) -> Cow<str> {
    if !s.bytes().any(|b| b == b'\\' || b == b'"') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    #[test]
    fn ident_stops_at_terminator() {
        let mut scanner = Scanner::new("weather,location=x");
        let (token, end) = scanner.ident(MEASUREMENT_SPECIAL, MEASUREMENT_SPECIAL);
        assert_eq!(token, "weather");
        assert_eq!(end, Ending::Delimiter(b','));
        assert_eq!(scanner.pos(), 8);
    }

    #[test]
    fn ident_collapses_escaped_special() {
        let mut scanner = Scanner::new("loc\\,ation=rest");
        let (token, end) = scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
        assert_eq!(token, "loc,ation");
        assert_eq!(end, Ending::Delimiter(b'='));
    }

    #[test]
    fn ident_keeps_backslash_before_ordinary_char() {
        let mut scanner = Scanner::new("a\\bc=rest");
        let (token, end) = scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
        assert_eq!(token, "a\\bc");
        assert_eq!(end, Ending::Delimiter(b'='));
    }

    #[test]
    fn ident_never_escapes_backslash() {
        // the first backslash stays literal, the second escapes the comma
        let mut scanner = Scanner::new("loc\\\\,ation=rest");
        let (token, end) = scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
        assert_eq!(token, "loc\\,ation");
        assert_eq!(end, Ending::Delimiter(b'='));
    }

    #[test]
    fn ident_consumes_offending_newline() {
        let mut scanner = Scanner::new("loc\nation");
        let (_, end) = scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
        assert_eq!(end, Ending::Newline);
        assert_eq!(scanner.pos(), 4);
    }

    #[test]
    fn ident_reports_eof() {
        let mut scanner = Scanner::new("weather");
        let (token, end) = scanner.ident(MEASUREMENT_SPECIAL, MEASUREMENT_SPECIAL);
        assert_eq!(token, "weather");
        assert_eq!(end, Ending::Eof);
    }

    #[test]
    fn unescaped_equals_is_legal_in_tag_values() {
        let mut scanner = Scanner::new("us=midwest rest");
        let (token, end) = scanner.ident(KEY_SPECIAL, TAG_VALUE_TERMINATORS);
        assert_eq!(token, "us=midwest");
        assert_eq!(end, Ending::Delimiter(b' '));
    }

    #[test]
    fn quoted_collapses_both_pairs() {
        let mut scanner = Scanner::new("\"8\\\"2\" rest");
        assert_eq!(scanner.quoted().unwrap(), "8\"2");
        assert_eq!(scanner.peek(), Some(b' '));
    }

    #[test]
    fn quoted_passes_through_unknown_escapes() {
        let mut scanner = Scanner::new("\"a\\x2\"");
        assert_eq!(scanner.quoted().unwrap(), "a\\x2");
    }

    #[test]
    fn quoted_accepts_raw_newlines() {
        let mut scanner = Scanner::new("\"8\n2\"");
        assert_eq!(scanner.quoted().unwrap(), "8\n2");
    }

    #[test]
    fn quoted_requires_termination() {
        let mut scanner = Scanner::new("\"8");
        assert!(scanner.quoted().is_err());
    }

    #[test]
    fn escape_is_borrowing_when_clean() {
        assert!(matches!(
            escape("weather", MEASUREMENT_SPECIAL),
            Cow::Borrowed(_)
        ));
        assert_eq!(escape("us midwest", KEY_SPECIAL), "us\\ midwest");
        assert_eq!(escape("a\\b", KEY_SPECIAL), "a\\b");
    }

    #[quickcheck]
    fn escape_ident_roundtrip(s: String) -> TestResult {
        if s.contains('\n') || s.contains('\r') {
            return TestResult::discard();
        }

        let escaped = escape(&s, KEY_SPECIAL);
        let mut scanner = Scanner::new(&escaped);
        let (token, end) = scanner.ident(KEY_SPECIAL, KEY_SPECIAL);
        TestResult::from_bool(token == s && end == Ending::Eof)
    }

    #[quickcheck]
    fn escape_quoted_roundtrip(s: String) -> bool {
        let mut quoted = String::from("\"");
        quoted.push_str(&escape_quoted(&s));
        quoted.push('"');

        let mut scanner = Scanner::new(&quoted);
        scanner.quoted().map_or(false, |token| token == s)
    }
}
