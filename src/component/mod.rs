//! The in-memory component tree.
//!
//! A [`Component`] is a named container of properties and child components.
//! Both lists keep insertion order and permit duplicates; the writer emits
//! everything in the order it is stored, so parse → serialise is
//! deterministic. Names are ASCII-case-insensitive and normalised to
//! uppercase on construction.

use derive_more::From;

use crate::parser::{ContentLine, Parameters};
use crate::types::{CalDateTime, CalDuration, Geo, Recur};

/// A named container of properties and child components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    name: String,
    properties: Vec<Property>,
    components: Vec<Component>,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Component {
            name: name.to_uppercase(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    /// First property with the given name.
    pub fn property<'c>(&'c self, name: &str) -> Option<&'c Property> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }

    pub fn properties_named<'c>(&'c self, name: &'c str) -> impl Iterator<Item = &'c Property> {
        self.properties
            .iter()
            .filter(move |property| property.name.eq_ignore_ascii_case(name))
    }

    pub fn components_named<'c>(&'c self, name: &'c str) -> impl Iterator<Item = &'c Component> {
        self.components
            .iter()
            .filter(move |component| component.name.eq_ignore_ascii_case(name))
    }
}

/// A named, parameterised, typed datum inside a component.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    pub params: Parameters,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: &str, value: impl Into<PropertyValue>) -> Self {
        Property {
            name: name.to_uppercase(),
            params: Parameters::new(),
            value: value.into(),
        }
    }

    /// Shorthand for a TEXT property.
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Property::new(name, PropertyValue::Text(value.into()))
    }

    pub fn from_parts(name: String, params: Parameters, value: PropertyValue) -> Self {
        Property {
            name: name.to_uppercase(),
            params,
            value,
        }
    }

    pub fn with_params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Text(text) | PropertyValue::Raw(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<CalDateTime> {
        match self.value {
            PropertyValue::DateTime(stamp) => Some(stamp),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<CalDuration> {
        match self.value {
            PropertyValue::Duration(duration) => Some(duration),
            _ => None,
        }
    }

    pub fn as_geo(&self) -> Option<Geo> {
        match self.value {
            PropertyValue::Geo(geo) => Some(geo),
            _ => None,
        }
    }

    pub fn as_recur(&self) -> Option<&Recur> {
        match &self.value {
            PropertyValue::Recur(recur) => Some(recur),
            _ => None,
        }
    }

    /// Plain wire form of the property. Writer-side parameter defaults (such
    /// as `VALUE=DATE`) are applied by [`crate::IcalWriter`], not here.
    pub fn to_content_line(&self) -> ContentLine {
        ContentLine {
            name: self.name.clone(),
            params: self.params.clone(),
            value: self.value.to_wire(),
        }
    }
}

/// Tagged property value.
///
/// Values that fail to parse under their declared kind are kept as
/// [`PropertyValue::Raw`] so they round-trip untouched, as do values of
/// unregistered properties.
#[derive(Debug, Clone, PartialEq, From)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    DateTime(CalDateTime),
    Duration(CalDuration),
    Geo(Geo),
    Recur(Recur),
    #[from(ignore)]
    Raw(String),
}

impl PropertyValue {
    pub fn to_wire(&self) -> String {
        match self {
            PropertyValue::Text(text) | PropertyValue::Raw(text) => text.clone(),
            PropertyValue::Integer(value) => value.to_string(),
            PropertyValue::DateTime(stamp) => stamp.format(),
            PropertyValue::Duration(duration) => duration.format(),
            PropertyValue::Geo(geo) => geo.format(),
            PropertyValue::Recur(recur) => recur.format(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_owned())
    }
}
