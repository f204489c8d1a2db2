/// Error arising when trying to parse a DURATION value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid duration: {0}")]
pub struct InvalidDuration(pub String);

/// An iCalendar DURATION, kept in its parsed fields so the exact wire form
/// survives a round-trip (`P1W` is not rewritten to `P7D`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CalDuration {
    pub negative: bool,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CalDuration {
    /// Parse an ISO 8601 duration such as `P1D`, `-PT15M` or `P2W`.
    pub fn parse(input: &str) -> Result<Self, InvalidDuration> {
        let err = || InvalidDuration(input.to_owned());
        let mut out = CalDuration::default();

        let mut rest = input;
        if let Some(tail) = rest.strip_prefix('-') {
            out.negative = true;
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('+') {
            rest = tail;
        }
        rest = rest.strip_prefix(['P', 'p']).ok_or_else(err)?;

        let mut in_time = false;
        let mut seen_field = false;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix(['T', 't']) {
                in_time = true;
                rest = tail;
                continue;
            }
            let digits_end = rest
                .find(|ch: char| !ch.is_ascii_digit())
                .filter(|&end| end > 0)
                .ok_or_else(err)?;
            let amount: u64 = rest[..digits_end].parse().map_err(|_| err())?;
            let unit = rest[digits_end..]
                .chars()
                .next()
                .map(|ch| ch.to_ascii_uppercase())
                .ok_or_else(err)?;
            match (unit, in_time) {
                ('W', false) => out.weeks = amount,
                ('D', false) => out.days = amount,
                ('H', true) => out.hours = amount,
                ('M', true) => out.minutes = amount,
                ('S', true) => out.seconds = amount,
                _ => return Err(err()),
            }
            seen_field = true;
            rest = &rest[digits_end + 1..];
        }
        if !seen_field {
            return Err(err());
        }
        Ok(out)
    }

    pub fn format(&self) -> String {
        let mut out = String::from(if self.negative { "-P" } else { "P" });
        if self.weeks > 0 {
            out += &format!("{}W", self.weeks);
        }
        if self.days > 0 {
            out += &format!("{}D", self.days);
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            out.push('T');
            if self.hours > 0 {
                out += &format!("{}H", self.hours);
            }
            if self.minutes > 0 {
                out += &format!("{}M", self.minutes);
            }
            if self.seconds > 0 {
                out += &format!("{}S", self.seconds);
            }
        }
        if out.ends_with('P') {
            out += "T0S";
        }
        out
    }

    /// Signed total length in seconds.
    pub fn as_seconds(&self) -> i64 {
        let total = self.weeks * 7 * 86_400
            + self.days * 86_400
            + self.hours * 3_600
            + self.minutes * 60
            + self.seconds;
        if self.negative {
            -(total as i64)
        } else {
            total as i64
        }
    }
}
