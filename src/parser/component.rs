//! Assemble wire events into component trees.

use std::io::BufRead;

use crate::component::Component;
use crate::parser::{ContentLine, LineListener, ParseControl, RawReader, ReadError};
use crate::registry::Registry;
use crate::validator::{Warning, code};

/// Listener that builds one top-level component, then stops the reader.
struct TreeBuilder<'r> {
    registry: &'r Registry,
    stack: Vec<Component>,
    finished: Option<Component>,
    warnings: Vec<Warning>,
}

impl<'r> TreeBuilder<'r> {
    fn new(registry: &'r Registry) -> Self {
        TreeBuilder {
            registry,
            stack: Vec::new(),
            finished: None,
            warnings: Vec::new(),
        }
    }

    fn path(&self) -> Vec<String> {
        self.stack
            .iter()
            .map(|component| component.name().to_owned())
            .collect()
    }

    fn warn(&mut self, warning: Warning) {
        let path = self.path();
        self.warnings.push(warning.located(&path));
    }
}

impl LineListener for TreeBuilder<'_> {
    fn begin_component(&mut self, name: &str) -> ParseControl {
        self.stack.push(Component::new(name));
        ParseControl::Continue
    }

    fn end_component(&mut self, name: &str) -> ParseControl {
        match self.stack.pop() {
            Some(open) if open.name().eq_ignore_ascii_case(name) => match self.stack.last_mut() {
                Some(parent) => {
                    parent.add_component(open);
                    ParseControl::Continue
                }
                None => {
                    self.finished = Some(open);
                    ParseControl::Stop
                }
            },
            Some(open) => {
                // stray marker, put the open component back and carry on
                tracing::debug!(found = name, open = open.name(), "unmatched END marker");
                self.stack.push(open);
                self.warn(Warning::new(code::UNMATCHED_END).with_args([name]));
                ParseControl::Continue
            }
            None => {
                tracing::debug!(found = name, "END marker with no open component");
                self.warn(Warning::new(code::UNMATCHED_END).with_args([name]));
                ParseControl::Continue
            }
        }
    }

    fn read_property(&mut self, line: ContentLine) -> ParseControl {
        let Some(parent) = self.stack.last_mut() else {
            let warning = Warning::new(code::PROPERTY_OUTSIDE_COMPONENT)
                .with_args([line.name.as_str()])
                .for_property(&line.name);
            self.warnings.push(warning);
            return ParseControl::Continue;
        };
        let (property, mut decode_warnings) = self.registry.decode(line);
        parent.add_property(property);
        if !decode_warnings.is_empty() {
            let path = self.path();
            self.warnings
                .extend(decode_warnings.drain(..).map(|warning| warning.located(&path)));
        }
        ParseControl::Continue
    }

    fn invalid_line(&mut self, raw: &str) -> ParseControl {
        tracing::debug!(line = raw, "discarding unparseable line");
        self.warn(Warning::new(code::INVALID_LINE).with_args([raw]));
        ParseControl::Continue
    }

    fn valueless_parameter(&mut self, property: &str, parameter: &str) -> ParseControl {
        self.warn(
            Warning::new(code::VALUELESS_PARAMETER)
                .with_args([property, parameter])
                .for_property(property),
        );
        ParseControl::Continue
    }
}

/// Reads top-level components off an iCalendar stream, one per call.
///
/// ```
/// let input = b"BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//x//EN\r\nEND:VCALENDAR\r\n";
/// let mut reader = calwire::IcalReader::from_slice(input.as_slice());
/// let calendar = reader.read_next().unwrap().unwrap();
/// assert_eq!(calendar.name(), "VCALENDAR");
/// ```
pub struct IcalReader<R> {
    raw: RawReader<R>,
    registry: Registry,
    warnings: Vec<Warning>,
}

impl<'a> IcalReader<&'a [u8]> {
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(slice)
    }
}

impl<R: BufRead> IcalReader<R> {
    pub fn new(reader: R) -> Self {
        IcalReader {
            raw: RawReader::new(reader),
            registry: Registry::ical(),
            warnings: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Disable or re-enable RFC 6868 circumflex decoding (on by default).
    pub fn caret_decoding(mut self, enabled: bool) -> Self {
        self.raw = self.raw.caret_decoding(enabled);
        self
    }

    /// Read the next top-level component. `None` at end of stream.
    ///
    /// Recoverable faults for this component are collected and stay
    /// available from [`warnings`](Self::warnings) until the next read.
    pub fn read_next(&mut self) -> Result<Option<Component>, ReadError> {
        let mut builder = TreeBuilder::new(&self.registry);
        self.raw.read(&mut builder)?;
        let TreeBuilder {
            stack,
            finished,
            warnings,
            ..
        } = builder;
        self.warnings = warnings;
        match finished {
            Some(component) => Ok(Some(component)),
            None => match stack.into_iter().next_back() {
                Some(open) => Err(ReadError::UnterminatedComponent(open.name().to_owned())),
                None => Ok(None),
            },
        }
    }

    /// Warnings collected by the most recent [`read_next`](Self::read_next).
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Expect exactly one component in the input and return it together
    /// with its warnings.
    pub fn read_one(mut self) -> Result<(Component, Vec<Warning>), ReadError> {
        let component = self.read_next()?.ok_or(ReadError::EmptyInput)?;
        let warnings = std::mem::take(&mut self.warnings);
        if self.read_next()?.is_some() {
            return Err(ReadError::TooManyComponents);
        }
        Ok((component, warnings))
    }
}

impl<R: BufRead> Iterator for IcalReader<R> {
    type Item = Result<Component, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
