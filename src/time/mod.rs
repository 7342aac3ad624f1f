pub mod duration;
pub mod estimate;

pub use duration::{DurationComponents, format_duration, parse_duration};
pub use estimate::{Detected, Normalized, TimeEstimate, TimeFormat, detect, normalize};
