mod error;
pub use error::ReadError;

mod line;
pub use line::{Line, LineError, LineReader};

mod content_line;
pub use content_line::{ContentLine, LineListener, ParseControl, Parameters, RawReader};

mod component;
pub use component::IcalReader;
