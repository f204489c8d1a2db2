//! Split logical lines into wire events.
//!
//! Each logical line is scanned left to right into a property name, a list
//! of parameters and a value. The scanner understands double-quoted
//! parameter values, multi-valued parameters, backslash escapes and the
//! RFC 6868 circumflex encoding. The property value itself (everything
//! after the first unquoted `:`) is passed through verbatim.
//!
//! Results are not returned but dispatched to a [`LineListener`], one event
//! per line. The listener can stop the reader at any event; the reader then
//! returns without pulling further input and can be restarted.

use derive_more::From;
use std::fmt;
use std::io::BufRead;

use super::{Line, LineError, LineReader};
use crate::{
    PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_QUOTE, PARAM_VALUE_DELIMITER, VALUE_DELIMITER,
};

/// Ordered multimap of property parameters.
///
/// Names are ASCII-case-insensitive and held in uppercase; values keep their
/// insertion order. A parameter read without `=` keeps an empty value list.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, From)]
pub struct Parameters(Vec<(String, Vec<String>)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First value of the named parameter.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// All values of the named parameter, empty when absent or value-less.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values)
    }

    /// Append a value, creating the parameter if absent.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        match self
            .0
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, values)) => values.push(value.into()),
            None => self.0.push((name.to_uppercase(), vec![value.into()])),
        }
    }

    /// Record a parameter that carried no `=value` part.
    pub fn push_valueless(&mut self, name: &str) {
        if self.values(name).is_none() {
            self.0.push((name.to_uppercase(), vec![]));
        }
    }

    /// Replace all values of the named parameter.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_uppercase();
        if let Some(pos) = self.0.iter().position(|(key, _)| key == &name) {
            self.0[pos] = (name, vec![value.into()]);
        } else {
            self.0.push((name, vec![value.into()]));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// A parsed content line: `NAME[;PARAM=VALUE…]:VALUE`.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct ContentLine {
    /// Property name, uppercase.
    pub name: String,
    /// Property parameters in wire order.
    pub params: Parameters,
    /// Property value, verbatim.
    pub value: String,
}

impl fmt::Display for ContentLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "name: {}\nparams: {:?}\nvalue: {:?}",
            self.name, self.params, self.value
        )
    }
}

/// Verdict a listener returns from every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ParseControl {
    Continue,
    Stop,
}

impl ParseControl {
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, ParseControl::Stop)
    }
}

/// Receives wire events from [`RawReader::read`].
///
/// Returning [`ParseControl::Stop`] from any event makes the reader return
/// before another line is pulled from the stream; calling
/// [`RawReader::read`] again resumes where it left off.
pub trait LineListener {
    /// A `BEGIN:NAME` marker. `name` is passed as written.
    fn begin_component(&mut self, name: &str) -> ParseControl;

    /// An `END:NAME` marker.
    fn end_component(&mut self, name: &str) -> ParseControl;

    /// Any other parseable line.
    fn read_property(&mut self, line: ContentLine) -> ParseControl;

    /// A line without a property name or `:` separator. Reading continues
    /// with the next line.
    fn invalid_line(&mut self, raw: &str) -> ParseControl {
        let _ = raw;
        ParseControl::Continue
    }

    /// A parameter without `=value` (bad syntax, kept with no values).
    fn valueless_parameter(&mut self, property: &str, parameter: &str) -> ParseControl {
        let _ = (property, parameter);
        ParseControl::Continue
    }
}

/// Streaming reader of the iCalendar content-line grammar.
pub struct RawReader<R> {
    lines: LineReader<R>,
    caret_decoding: bool,
}

impl<'a> RawReader<&'a [u8]> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(slice)
    }
}

impl<R: BufRead> RawReader<R> {
    pub fn new(reader: R) -> Self {
        RawReader {
            lines: LineReader::new(reader),
            caret_decoding: true,
        }
    }

    /// Disable or re-enable RFC 6868 circumflex decoding (on by default).
    pub fn caret_decoding(mut self, enabled: bool) -> Self {
        self.caret_decoding = enabled;
        self
    }

    /// Number of the physical line the last dispatched line started on.
    pub fn line_number(&self) -> usize {
        self.lines.line_number()
    }

    /// Dispatch events until end of stream or until the listener stops.
    pub fn read(&mut self, listener: &mut impl LineListener) -> Result<(), LineError> {
        while let Some(line) = self.lines.next_line()? {
            if self.dispatch(&line, listener).is_stop() {
                return Ok(());
            }
        }
        Ok(())
    }

    fn dispatch(&self, line: &Line, listener: &mut impl LineListener) -> ParseControl {
        let raw = line.as_str();
        let mut name: Option<String> = None;
        let mut params = Parameters::new();
        let mut param_name: Option<String> = None;
        let mut value: Option<&str> = None;
        let mut buffer = String::new();
        let mut escape: Option<char> = None;
        let mut in_quotes = false;

        for (pos, ch) in raw.char_indices() {
            let in_param_value = name.is_some() && param_name.is_some();
            if let Some(introducer) = escape.take() {
                match (introducer, ch) {
                    ('\\', '\\') => buffer.push('\\'),
                    ('\\', 'n' | 'N') => buffer.push('\n'),
                    ('\\', '"') => buffer.push('"'),
                    ('^', '^') => buffer.push('^'),
                    ('^', 'n') => buffer.push('\n'),
                    ('^', '\'') => buffer.push('"'),
                    _ => {
                        // not a recognised sequence, keep both characters
                        buffer.push(introducer);
                        buffer.push(ch);
                    }
                }
                continue;
            }
            if in_param_value && (ch == '\\' || (ch == '^' && self.caret_decoding)) {
                escape = Some(ch);
                continue;
            }
            if in_param_value && ch == PARAM_QUOTE {
                in_quotes = !in_quotes;
                continue;
            }
            if in_quotes {
                buffer.push(ch);
                continue;
            }
            match ch {
                PARAM_DELIMITER | VALUE_DELIMITER => {
                    if name.is_none() {
                        name = Some(std::mem::take(&mut buffer));
                    } else if let Some(param) = param_name.take() {
                        params.push(&param, std::mem::take(&mut buffer));
                    } else {
                        let parameter = std::mem::take(&mut buffer);
                        let property = name.as_deref().unwrap_or_default();
                        if listener.valueless_parameter(property, &parameter).is_stop() {
                            return ParseControl::Stop;
                        }
                        params.push_valueless(&parameter);
                    }
                    if ch == VALUE_DELIMITER {
                        value = Some(&raw[pos + VALUE_DELIMITER.len_utf8()..]);
                        break;
                    }
                }
                PARAM_VALUE_DELIMITER if param_name.is_some() => {
                    // another value for the same parameter
                    if let Some(param) = param_name.as_deref() {
                        let finished = std::mem::take(&mut buffer);
                        params.push(param, finished);
                    }
                }
                PARAM_NAME_DELIMITER if name.is_some() && param_name.is_none() => {
                    param_name = Some(std::mem::take(&mut buffer));
                }
                _ => buffer.push(ch),
            }
        }

        let (Some(name), Some(value)) = (name.filter(|name| !name.is_empty()), value) else {
            return listener.invalid_line(raw);
        };
        if name.eq_ignore_ascii_case("BEGIN") {
            return listener.begin_component(value);
        }
        if name.eq_ignore_ascii_case("END") {
            return listener.end_component(value);
        }
        listener.read_property(ContentLine {
            name: name.to_uppercase(),
            params,
            value: value.to_owned(),
        })
    }
}
