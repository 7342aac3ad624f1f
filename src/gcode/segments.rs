//! Layer segmentation, mirroring how slicer hosts hand G-code to plugins.
//!
//! Everything before the first `;LAYER:` comment forms the header segment;
//! each layer comment opens a new segment. Concatenating the segments gives
//! back the original text.

use super::line::{LineKind, classify};

pub fn split_layers(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if matches!(classify(line), LineKind::LayerStart(_)) && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

pub fn join_segments(segments: &[String]) -> String {
    segments.concat()
}
