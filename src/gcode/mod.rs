pub mod line;
pub mod segments;

pub use line::{LineKind, classify};
pub use segments::{join_segments, split_layers};
