//! Line classifier for slicer G-code metadata.
//!
//! Slicers put their metadata in comment lines (`;` prefix). Only a handful
//! of those matter here: the two print time estimate conventions, the enable
//! marker placed in the start G-code, and the layer start comments. Every
//! match is anchored at the start of the line.

/// Label of the human-readable estimate comment (OrcaSlicer, PrusaSlicer).
pub const ESTIMATE_LABEL: &str = "estimated printing time (normal mode)";
/// Tag of the integer-seconds estimate (Cura).
pub const TIME_TAG: &str = "TIME:";
/// Placeholder token replaced in standalone mode.
pub const ENABLE_MARKER: &str = "ENABLE_BED_COOLDOWN";
/// Tag starting every layer in Cura output.
pub const LAYER_TAG: &str = "LAYER:";

/// Classification of a single G-code line, carrying the raw field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `; estimated printing time (normal mode) = <duration>`
    EstimatedTime(&'a str),
    /// `;TIME:<seconds>`
    TimeTag(&'a str),
    /// A line holding nothing but the enable marker.
    EnableMarker,
    /// `;LAYER:<n>`
    LayerStart(&'a str),
    Other,
}

/// Classify one line. A trailing `\n` or `\r\n` is ignored.
pub fn classify(line: &str) -> LineKind<'_> {
    let (line, _) = split_line_ending(line);

    if let Some(body) = comment_body(line) {
        if let Some(rest) = strip_prefix_ci(body, ESTIMATE_LABEL) {
            if let Some(value) = rest.trim_start().strip_prefix('=') {
                return LineKind::EstimatedTime(value.trim());
            }
        }
        if let Some(value) = strip_prefix_ci(body, TIME_TAG) {
            return LineKind::TimeTag(value.trim());
        }
        if let Some(value) = strip_prefix_ci(body, LAYER_TAG) {
            return LineKind::LayerStart(value.trim());
        }
    }

    if is_enable_marker(line) {
        return LineKind::EnableMarker;
    }

    LineKind::Other
}

/// True for the `;LAYER:0` anchor that opens the first printed layer.
pub fn is_first_layer(line: &str) -> bool {
    matches!(classify(line), LineKind::LayerStart("0"))
}

/// Split a line into its content and its line ending (`""`, `"\n"` or `"\r\n"`).
pub fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, &line[content.len()..])
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, &line[content.len()..])
    } else {
        (line, "")
    }
}

/// Comment text after `;` and any whitespace. Requires `;` in column one.
fn comment_body(line: &str) -> Option<&str> {
    line.strip_prefix(';').map(str::trim_start)
}

// Case-sensitive on purpose: firmware macro names are case-sensitive.
fn is_enable_marker(line: &str) -> bool {
    let trimmed = line.trim();
    let token = trimmed.strip_prefix(';').unwrap_or(trimmed).trim();
    token == ENABLE_MARKER
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
