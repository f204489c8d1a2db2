//! Serialise wire events back into folded content lines.
//!
//! [`RawWriter`] is the mirror image of the raw reader: it takes
//! begin/end/property events, encodes parameter values (quoting and
//! RFC 6868 circumflex encoding), assembles `name[;param=value…]:value`
//! and folds every logical line so no physical line exceeds 75 octets.

mod ical;
pub use ical::{IcalWriter, write_to_string};

use std::io::Write;

use crate::parser::ContentLine;
use crate::{
    FOLD_WIDTH, PARAM_DELIMITER, PARAM_NAME_DELIMITER, PARAM_VALUE_DELIMITER, VALUE_DELIMITER,
};

/// Error aborting a write.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("parameter {0} contains a {1} that cannot be written with circumflex encoding disabled")]
    UnencodableParameter(String, &'static str),
}

/// Fold a logical line into physical segments of at most 75 octets.
///
/// Breaks only at character boundaries; every continuation segment carries
/// its leading space. A line that already fits is returned as-is, so
/// folding is idempotent.
pub fn fold_line(line: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = line;
    let mut first = true;
    loop {
        let limit = if first { FOLD_WIDTH } else { FOLD_WIDTH - 1 };
        if rest.len() <= limit {
            segments.push(if first {
                rest.to_owned()
            } else {
                format!(" {rest}")
            });
            return segments;
        }
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        segments.push(if first {
            head.to_owned()
        } else {
            format!(" {head}")
        });
        rest = tail;
        first = false;
    }
}

fn encode_parameter_value(
    parameter: &str,
    value: &str,
    caret: bool,
) -> Result<String, WriteError> {
    let mut encoded = String::with_capacity(value.len());
    if caret {
        let mut chars = value.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '^' => encoded.push_str("^^"),
                '"' => encoded.push_str("^'"),
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    encoded.push_str("^n");
                }
                '\n' => encoded.push_str("^n"),
                _ => encoded.push(ch),
            }
        }
    } else {
        if value.contains(['\r', '\n']) {
            return Err(WriteError::UnencodableParameter(
                parameter.to_owned(),
                "newline",
            ));
        }
        if value.contains('"') {
            return Err(WriteError::UnencodableParameter(
                parameter.to_owned(),
                "double quote",
            ));
        }
        encoded.push_str(value);
    }
    let needs_quotes = encoded.contains([PARAM_DELIMITER, VALUE_DELIMITER, PARAM_VALUE_DELIMITER])
        || encoded.contains(char::is_whitespace);
    if needs_quotes {
        Ok(format!("\"{encoded}\""))
    } else {
        Ok(encoded)
    }
}

/// Streaming writer of the content-line wire format.
pub struct RawWriter<W: Write> {
    sink: W,
    caret_encoding: bool,
}

impl<W: Write> RawWriter<W> {
    pub fn new(sink: W) -> Self {
        RawWriter {
            sink,
            caret_encoding: true,
        }
    }

    /// Disable or re-enable RFC 6868 circumflex encoding (on by default).
    pub fn caret_encoding(mut self, enabled: bool) -> Self {
        self.caret_encoding = enabled;
        self
    }

    pub fn begin_component(&mut self, name: &str) -> Result<(), WriteError> {
        self.write_line(&format!("BEGIN:{name}"))
    }

    pub fn end_component(&mut self, name: &str) -> Result<(), WriteError> {
        self.write_line(&format!("END:{name}"))
    }

    /// Serialise one property. Parameters are emitted in stored order; a
    /// parameter without values round-trips as a bare `;NAME`.
    pub fn write_property(&mut self, line: &ContentLine) -> Result<(), WriteError> {
        let mut out = String::with_capacity(line.name.len() + line.value.len() + 16);
        out.push_str(&line.name);
        for (name, values) in line.params.iter() {
            out.push(PARAM_DELIMITER);
            out.push_str(name);
            if values.is_empty() {
                continue;
            }
            out.push(PARAM_NAME_DELIMITER);
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    out.push(PARAM_VALUE_DELIMITER);
                }
                out.push_str(&encode_parameter_value(name, value, self.caret_encoding)?);
            }
        }
        out.push(VALUE_DELIMITER);
        out.push_str(&line.value);
        self.write_line(&out)
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> Result<W, WriteError> {
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn write_line(&mut self, line: &str) -> Result<(), WriteError> {
        for segment in fold_line(line) {
            self.sink.write_all(segment.as_bytes())?;
            self.sink.write_all(b"\r\n")?;
        }
        Ok(())
    }
}
