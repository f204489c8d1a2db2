use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Error arising when trying to parse a DATE or DATE-TIME value
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalDateTimeError {
    #[error("invalid date-time: {0}")]
    InvalidFormat(String),
    #[error("date-time out of range: {0}")]
    OutOfRange(String),
}

/// An iCalendar timestamp: a date with an optional time of day.
///
/// Time zones are not resolved here. The only zone information kept is
/// whether the value carried the UTC marker; everything else is treated as
/// an opaque local stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalDateTime {
    date: NaiveDate,
    time: Option<NaiveTime>,
    utc: bool,
}

impl CalDateTime {
    pub fn date(date: NaiveDate) -> Self {
        CalDateTime {
            date,
            time: None,
            utc: false,
        }
    }

    pub fn date_time(date: NaiveDate, time: NaiveTime, utc: bool) -> Self {
        CalDateTime {
            date,
            time: Some(time),
            utc,
        }
    }

    #[inline]
    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        self.time.is_none()
    }

    #[inline]
    pub fn is_utc(&self) -> bool {
        self.utc
    }

    /// The stamp as an instant, using midnight for date-only values.
    pub fn as_instant(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Parse `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`.
    pub fn parse(input: &str) -> Result<Self, CalDateTimeError> {
        let (body, utc) = match input.strip_suffix(['Z', 'z']) {
            Some(body) => (body, true),
            None => (input, false),
        };
        let (date_part, time_part) = match body.split_once(['T', 't']) {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };
        if utc && time_part.is_none() {
            // a UTC marker on a bare date
            return Err(CalDateTimeError::InvalidFormat(input.to_owned()));
        }
        let date = parse_date(date_part, input)?;
        let time = time_part.map(|part| parse_time(part, input)).transpose()?;
        Ok(CalDateTime { date, time, utc })
    }

    pub fn format(&self) -> String {
        match self.time {
            None => self.date.format("%Y%m%d").to_string(),
            Some(time) => format!(
                "{}T{}{}",
                self.date.format("%Y%m%d"),
                time.format("%H%M%S"),
                if self.utc { "Z" } else { "" }
            ),
        }
    }
}

fn digits(part: &str, len: usize) -> bool {
    part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
}

fn parse_date(part: &str, input: &str) -> Result<NaiveDate, CalDateTimeError> {
    if !digits(part, 8) {
        return Err(CalDateTimeError::InvalidFormat(input.to_owned()));
    }
    let field = |range: std::ops::Range<usize>| {
        part[range]
            .parse()
            .map_err(|_| CalDateTimeError::InvalidFormat(input.to_owned()))
    };
    NaiveDate::from_ymd_opt(field(0..4)?, field(4..6)? as u32, field(6..8)? as u32)
        .ok_or_else(|| CalDateTimeError::OutOfRange(input.to_owned()))
}

fn parse_time(part: &str, input: &str) -> Result<NaiveTime, CalDateTimeError> {
    if !digits(part, 6) {
        return Err(CalDateTimeError::InvalidFormat(input.to_owned()));
    }
    let field = |range: std::ops::Range<usize>| {
        part[range]
            .parse::<u32>()
            .map_err(|_| CalDateTimeError::InvalidFormat(input.to_owned()))
    };
    NaiveTime::from_hms_opt(field(0..2)?, field(2..4)?, field(4..6)?)
        .ok_or_else(|| CalDateTimeError::OutOfRange(input.to_owned()))
}
