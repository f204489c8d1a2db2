mod datetime;
pub use datetime::{CalDateTime, CalDateTimeError};

mod duration;
pub use duration::{CalDuration, InvalidDuration};

mod geo;
pub use geo::{Geo, InvalidGeo};

mod recur;
pub use recur::{InvalidRecur, Recur};
