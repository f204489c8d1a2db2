//! Property and component registries.
//!
//! A [`Registry`] is an immutable lookup table handed to the object reader,
//! the object writer and the validator at construction. It decides which
//! value kind a property name decodes into and which rule set applies to a
//! component name. Dialects are just different constructors; nothing here
//! is global state.

use std::collections::HashMap;

use crate::component::{Property, PropertyValue};
use crate::parser::ContentLine;
use crate::types::{CalDateTime, CalDuration, Geo, Recur};
use crate::validator::{ComponentRules, Warning, code, rules};

/// The wire kinds the default registries dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    DateTime,
    Duration,
    Geo,
    Recur,
    Raw,
}

impl ValueKind {
    fn parse(self, value: &str) -> Result<PropertyValue, String> {
        match self {
            ValueKind::Text => Ok(PropertyValue::Text(value.to_owned())),
            ValueKind::Raw => Ok(PropertyValue::Raw(value.to_owned())),
            ValueKind::Integer => value
                .trim()
                .parse()
                .map(PropertyValue::Integer)
                .map_err(|err| err.to_string()),
            ValueKind::DateTime => CalDateTime::parse(value)
                .map(Into::into)
                .map_err(|err| err.to_string()),
            ValueKind::Duration => CalDuration::parse(value)
                .map(Into::into)
                .map_err(|err| err.to_string()),
            ValueKind::Geo => Geo::parse(value)
                .map(Into::into)
                .map_err(|err| err.to_string()),
            ValueKind::Recur => Recur::parse(value)
                .map(Into::into)
                .map_err(|err| err.to_string()),
        }
    }

    /// The kind a `VALUE=` parameter selects, if it names one we know.
    fn from_value_param(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "TEXT" => Some(ValueKind::Text),
            "INTEGER" => Some(ValueKind::Integer),
            "DATE" | "DATE-TIME" => Some(ValueKind::DateTime),
            "DURATION" => Some(ValueKind::Duration),
            "RECUR" => Some(ValueKind::Recur),
            _ => None,
        }
    }
}

/// Immutable property and component tables for one iCalendar dialect.
#[derive(Debug, Clone)]
pub struct Registry {
    kinds: HashMap<String, ValueKind>,
    rules: HashMap<String, &'static ComponentRules>,
}

impl Registry {
    /// The RFC 5545 property set and component rules.
    pub fn ical() -> Self {
        let mut kinds = HashMap::new();
        for name in [
            "ACTION",
            "ATTACH",
            "ATTENDEE",
            "CALSCALE",
            "CATEGORIES",
            "CLASS",
            "COMMENT",
            "CONTACT",
            "DESCRIPTION",
            "EXDATE",
            "FREEBUSY",
            "LOCATION",
            "METHOD",
            "ORGANIZER",
            "PRODID",
            "RDATE",
            "RELATED-TO",
            "REQUEST-STATUS",
            "RESOURCES",
            "STATUS",
            "SUMMARY",
            "TRANSP",
            "TZID",
            "TZNAME",
            "TZOFFSETFROM",
            "TZOFFSETTO",
            "TZURL",
            "UID",
            "URL",
            "VERSION",
        ] {
            kinds.insert(name.to_owned(), ValueKind::Text);
        }
        for name in [
            "COMPLETED",
            "CREATED",
            "DTEND",
            "DTSTAMP",
            "DTSTART",
            "DUE",
            "LAST-MODIFIED",
            "RECURRENCE-ID",
        ] {
            kinds.insert(name.to_owned(), ValueKind::DateTime);
        }
        for (name, kind) in [
            ("DURATION", ValueKind::Duration),
            ("TRIGGER", ValueKind::Duration),
            ("GEO", ValueKind::Geo),
            ("RRULE", ValueKind::Recur),
            ("PERCENT-COMPLETE", ValueKind::Integer),
            ("PRIORITY", ValueKind::Integer),
            ("REPEAT", ValueKind::Integer),
            ("SEQUENCE", ValueKind::Integer),
        ] {
            kinds.insert(name.to_owned(), kind);
        }

        let mut rule_sets: HashMap<String, &'static ComponentRules> = HashMap::new();
        for (name, set) in [
            ("VCALENDAR", &rules::VCALENDAR),
            ("VEVENT", &rules::VEVENT),
            ("VTODO", &rules::VTODO),
            ("VJOURNAL", &rules::VJOURNAL),
            ("VFREEBUSY", &rules::VFREEBUSY),
            ("VALARM", &rules::VALARM),
            ("VTIMEZONE", &rules::VTIMEZONE),
            ("STANDARD", &rules::TZ_TRANSITION),
            ("DAYLIGHT", &rules::TZ_TRANSITION),
        ] {
            rule_sets.insert(name.to_owned(), set);
        }

        Registry {
            kinds,
            rules: rule_sets,
        }
    }

    /// The RFC 2445 dialect: RFC 5545 plus the withdrawn `EXRULE` property.
    pub fn ical_legacy() -> Self {
        Self::ical().with_kind("EXRULE", ValueKind::Recur)
    }

    /// Override or extend the property table.
    pub fn with_kind(mut self, name: &str, kind: ValueKind) -> Self {
        self.kinds.insert(name.to_uppercase(), kind);
        self
    }

    /// Override or extend the component rule table.
    pub fn with_rules(mut self, name: &str, set: &'static ComponentRules) -> Self {
        self.rules.insert(name.to_uppercase(), set);
        self
    }

    /// Declared value kind of a property; `None` for unregistered names.
    pub fn kind_of(&self, name: &str) -> Option<ValueKind> {
        self.kinds.get(&name.to_uppercase()).copied()
    }

    pub fn rules_for(&self, component: &str) -> Option<&'static ComponentRules> {
        self.rules.get(&component.to_uppercase()).copied()
    }

    /// Decode one content line into a typed property.
    ///
    /// A `VALUE=` parameter overrides the declared kind unless the property
    /// is declared (or defaults to) opaque text. Values that fail to parse
    /// are kept raw and reported, never dropped.
    pub fn decode(&self, line: ContentLine) -> (Property, Vec<Warning>) {
        let declared = self.kind_of(&line.name).unwrap_or(ValueKind::Raw);
        let kind = match declared {
            ValueKind::Text | ValueKind::Raw => declared,
            _ => line
                .params
                .get("VALUE")
                .and_then(ValueKind::from_value_param)
                .unwrap_or(declared),
        };

        let mut warnings = Vec::new();
        let value = match kind.parse(&line.value) {
            Ok(value) => value,
            Err(message) => {
                tracing::debug!(property = %line.name, %message, "keeping malformed value as raw");
                warnings.push(
                    Warning::new(code::MALFORMED_VALUE)
                        .with_args([line.name.clone(), message])
                        .for_property(&line.name),
                );
                PropertyValue::Raw(line.value.clone())
            }
        };
        (Property::from_parts(line.name, line.params, value), warnings)
    }
}
