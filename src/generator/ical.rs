use std::io::Write;

use crate::component::{Component, Property, PropertyValue};
use crate::generator::{RawWriter, WriteError};
use crate::parser::ContentLine;
use crate::registry::{Registry, ValueKind};

/// Serialises component trees depth-first: `BEGIN`, properties in stored
/// order, children, `END`.
pub struct IcalWriter<W: Write> {
    raw: RawWriter<W>,
    registry: Registry,
}

impl<W: Write> IcalWriter<W> {
    pub fn new(sink: W) -> Self {
        IcalWriter {
            raw: RawWriter::new(sink),
            registry: Registry::ical(),
        }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Disable or re-enable RFC 6868 circumflex encoding (on by default).
    pub fn caret_encoding(mut self, enabled: bool) -> Self {
        self.raw = self.raw.caret_encoding(enabled);
        self
    }

    /// Write one component tree.
    pub fn write(&mut self, component: &Component) -> Result<(), WriteError> {
        self.raw.begin_component(component.name())?;
        for property in component.properties() {
            let line = self.encode_property(property);
            self.raw.write_property(&line)?;
        }
        for child in component.components() {
            self.write(child)?;
        }
        self.raw.end_component(component.name())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(self) -> Result<W, WriteError> {
        self.raw.into_inner()
    }

    /// Wire form of a property. A date-only value under a property whose
    /// declared kind is DATE-TIME gets a `VALUE=DATE` parameter, unless one
    /// is already present.
    fn encode_property(&self, property: &Property) -> ContentLine {
        let mut line = property.to_content_line();
        if let PropertyValue::DateTime(stamp) = &property.value
            && !stamp.has_time()
            && self.registry.kind_of(property.name()) == Some(ValueKind::DateTime)
            && line.params.get("VALUE").is_none()
        {
            line.params.set("VALUE", "DATE");
        }
        line
    }
}

/// Serialise a component tree to a string with default settings.
pub fn write_to_string(component: &Component) -> Result<String, WriteError> {
    let mut writer = IcalWriter::new(Vec::new());
    writer.write(component)?;
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
