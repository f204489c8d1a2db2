use crate::parser::LineError;

/// Error aborting an object read.
///
/// Everything recoverable (unparseable lines, bad parameter syntax,
/// malformed values) is reported as a warning instead and never surfaces
/// here.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Line(#[from] LineError),
    #[error("component {0} is never closed")]
    UnterminatedComponent(String),
    #[error("empty input")]
    EmptyInput,
    #[error("too many components in input, expected one")]
    TooManyComponents,
}
