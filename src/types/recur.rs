/// Error arising when trying to parse a RECUR value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid recurrence rule: {0}")]
pub struct InvalidRecur(pub String);

/// A recurrence rule kept as its ordered `KEY=VALUE` parts.
///
/// Rules are not expanded into occurrences here; the parts are retained
/// verbatim so the rule round-trips and individual rule parts can be
/// inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Recur {
    parts: Vec<(String, String)>,
}

impl Recur {
    pub fn parse(input: &str) -> Result<Self, InvalidRecur> {
        let mut parts = Vec::new();
        for part in input.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(InvalidRecur(input.to_owned()));
            };
            if key.is_empty() || value.is_empty() {
                return Err(InvalidRecur(input.to_owned()));
            }
            parts.push((key.to_uppercase(), value.to_owned()));
        }
        Ok(Recur { parts })
    }

    /// Value of the named rule part.
    pub fn get(&self, part: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(part))
            .map(|(_, value)| value.as_str())
    }

    pub fn freq(&self) -> Option<&str> {
        self.get("FREQ")
    }

    /// True when any of BYHOUR, BYMINUTE or BYSECOND is present.
    pub fn constrains_time(&self) -> bool {
        ["BYHOUR", "BYMINUTE", "BYSECOND"]
            .iter()
            .any(|part| self.get(part).is_some())
    }

    pub fn format(&self) -> String {
        self.parts
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}
