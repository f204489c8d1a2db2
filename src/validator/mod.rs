//! Semantic validation of component trees.
//!
//! Validation is a read-only traversal: rule violations are collected as
//! [`Warning`]s and never abort the walk or mutate the tree. Which rules
//! apply to which component is part of the [`Registry`](crate::Registry),
//! so dialects can carry their own rule sets.

use std::fmt;

use crate::component::Component;
use crate::registry::Registry;

pub mod rules;
pub use rules::ComponentRules;

/// Warning codes, stable across releases.
pub mod code {
    /// A line could not be parsed and was discarded.
    pub const INVALID_LINE: u32 = 1;
    /// A required property is missing.
    pub const MISSING_REQUIRED: u32 = 2;
    /// A property limited to one instance appears several times.
    pub const MULTIPLE_INSTANCES: u32 = 3;
    /// A value failed to parse under its declared kind and was kept raw.
    pub const MALFORMED_VALUE: u32 = 4;
    /// BYHOUR/BYMINUTE/BYSECOND used with a date-only DTSTART.
    pub const TIME_PARTS_WITH_DATE_START: u32 = 5;
    /// More than one RRULE in a component.
    pub const MULTIPLE_RRULES: u32 = 6;
    /// An END marker that matches no open component.
    pub const UNMATCHED_END: u32 = 7;
    /// A parameter without a value.
    pub const VALUELESS_PARAMETER: u32 = 8;
    /// A property outside of any component.
    pub const PROPERTY_OUTSIDE_COMPONENT: u32 = 9;
    /// A STATUS value from another component's vocabulary.
    pub const INVALID_STATUS: u32 = 13;
    /// DTSTART and RECURRENCE-ID disagree on having a time of day.
    pub const RECURRENCE_ID_TYPE_MISMATCH: u32 = 19;
    /// A start property that comes after its end property.
    pub const START_AFTER_END: u32 = 22;
    /// Start and end properties disagree on having a time of day.
    pub const START_END_TYPE_MISMATCH: u32 = 23;
    /// Two mutually exclusive properties are both present.
    pub const MUTUALLY_EXCLUSIVE: u32 = 24;
    /// A property that requires another one which is absent.
    pub const MISSING_COMPANION: u32 = 25;
    /// DURATION and REPEAT must appear together in an alarm.
    pub const REPEAT_DURATION_PAIR: u32 = 26;
}

/// A structured validation or parse warning.
///
/// Warnings are accumulated, never thrown; `path` names the component chain
/// from the root down to where the warning was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub code: u32,
    pub args: Vec<String>,
    pub path: Vec<String>,
    pub property: Option<String>,
}

impl Warning {
    pub fn new(code: u32) -> Self {
        Warning {
            code,
            args: Vec::new(),
            path: Vec::new(),
            property: None,
        }
    }

    pub fn with_args<A: Into<String>>(mut self, args: impl IntoIterator<Item = A>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn for_property(mut self, name: &str) -> Self {
        self.property = Some(name.to_owned());
        self
    }

    pub(crate) fn located(mut self, path: &[String]) -> Self {
        self.path = path.to_vec();
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let arg = |index: usize| self.args.get(index).map(String::as_str).unwrap_or("?");
        if !self.path.is_empty() {
            write!(f, "[{}] ", self.path.join(" > "))?;
        }
        match self.code {
            code::INVALID_LINE => write!(f, "unparseable line: {}", arg(0)),
            code::MISSING_REQUIRED => write!(f, "a {} property is required", arg(0)),
            code::MULTIPLE_INSTANCES => {
                write!(f, "there should be only one instance of {}", arg(0))
            }
            code::MALFORMED_VALUE => {
                write!(f, "{} value kept as raw text: {}", arg(0), arg(1))
            }
            code::TIME_PARTS_WITH_DATE_START => write!(
                f,
                "BYHOUR, BYMINUTE and BYSECOND rule parts require a date-time DTSTART"
            ),
            code::MULTIPLE_RRULES => write!(f, "there should be only one RRULE"),
            code::UNMATCHED_END => {
                write!(f, "END:{} does not match any open component", arg(0))
            }
            code::VALUELESS_PARAMETER => {
                write!(f, "parameter {} of property {} has no value", arg(1), arg(0))
            }
            code::PROPERTY_OUTSIDE_COMPONENT => {
                write!(f, "property {} found outside of any component", arg(0))
            }
            code::INVALID_STATUS => write!(
                f,
                "status {} is not valid here, allowed values: {}",
                arg(0),
                arg(1)
            ),
            code::RECURRENCE_ID_TYPE_MISMATCH => write!(
                f,
                "DTSTART and RECURRENCE-ID must be entirely dates or entirely date-times"
            ),
            code::START_AFTER_END => write!(f, "{} must come before {}", arg(0), arg(1)),
            code::START_END_TYPE_MISMATCH => write!(
                f,
                "{} and {} must be entirely dates or entirely date-times",
                arg(0),
                arg(1)
            ),
            code::MUTUALLY_EXCLUSIVE => {
                write!(f, "{} and {} cannot both be defined", arg(0), arg(1))
            }
            code::MISSING_COMPANION => {
                write!(f, "{} requires {} to be defined", arg(0), arg(1))
            }
            code::REPEAT_DURATION_PAIR => write!(
                f,
                "{} and {} must either both be defined or both be absent",
                arg(0),
                arg(1)
            ),
            other => write!(f, "warning {other}: {:?}", self.args),
        }
    }
}

/// Validate a component subtree against the registry's rule sets.
///
/// The traversal is depth-first in document order. Components without a
/// registered rule set produce no warnings of their own but their children
/// are still visited.
pub fn validate(component: &Component, registry: &Registry) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut path = Vec::new();
    walk(component, registry, &mut path, &mut warnings);
    warnings
}

fn walk(
    component: &Component,
    registry: &Registry,
    path: &mut Vec<String>,
    out: &mut Vec<Warning>,
) {
    path.push(component.name().to_owned());
    if let Some(rules) = registry.rules_for(component.name()) {
        let mut local = Vec::new();
        for name in rules.required {
            match component.properties_named(name).count() {
                1 => {}
                0 => local.push(
                    Warning::new(code::MISSING_REQUIRED)
                        .with_args([*name])
                        .for_property(name),
                ),
                _ => local.push(
                    Warning::new(code::MULTIPLE_INSTANCES)
                        .with_args([*name])
                        .for_property(name),
                ),
            }
        }
        for name in rules.at_most_one {
            if component.properties_named(name).count() > 1 {
                local.push(
                    Warning::new(code::MULTIPLE_INSTANCES)
                        .with_args([*name])
                        .for_property(name),
                );
            }
        }
        for check in rules.checks {
            check(component, &mut local);
        }
        out.extend(local.into_iter().map(|warning| warning.located(path)));
    }
    for child in component.components() {
        walk(child, registry, path, out);
    }
    path.pop();
}
