//! Print time estimate detection and cross-format normalization.
//!
//! Slicers report their estimate in one of two ways:
//!
//! ```text
//! ; estimated printing time (normal mode) = 1d 15h 43m 23s    (OrcaSlicer, PrusaSlicer)
//! ;TIME:142083                                                (Cura)
//! ```
//!
//! The human-readable comment wins when both are present. Whichever one is
//! found is converted to seconds and, optionally, the other one is written
//! next to it so downstream tools find the format they expect.

use super::duration::{DurationComponents, parse_duration};
use crate::error::{CooldownError, Result};
use crate::gcode::line::{ESTIMATE_LABEL, LineKind, TIME_TAG, classify, split_line_ending};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Estimated print time in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TimeEstimate(u64);

impl TimeEstimate {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn components(&self) -> DurationComponents {
        DurationComponents::from_secs(self.0)
    }

    /// `4h 54m 37s` style rendering.
    pub fn formatted(&self) -> String {
        self.components().to_string()
    }

    /// `;TIME:<secs>`
    pub fn tag_line(&self) -> String {
        format!(";{}{}", TIME_TAG, self.0)
    }

    /// `; estimated printing time (normal mode) = <duration>`
    pub fn estimate_line(&self) -> String {
        format!("; {} = {}", ESTIMATE_LABEL, self.formatted())
    }
}

impl fmt::Display for TimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two estimate conventions was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `; estimated printing time (normal mode) = ...`
    EstimatedPrintingTime,
    /// `;TIME:<secs>`
    TimeTag,
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFormat::EstimatedPrintingTime => write!(f, "estimated printing time"),
            TimeFormat::TimeTag => write!(f, "TIME tag"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detected {
    pub estimate: TimeEstimate,
    pub format: TimeFormat,
    /// Zero-based index of the matched line.
    pub line_index: usize,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub estimate: TimeEstimate,
    pub format: TimeFormat,
    pub line_index: usize,
    /// Input text, with the counterpart line added when cross-writing.
    pub text: String,
}

/// Find the first estimate in `lines`.
///
/// The first estimate comment is used if there is one anywhere; otherwise
/// the first TIME tag. Later occurrences are ignored.
pub fn detect<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<Detected> {
    let mut first_tag: Option<(usize, &'a str)> = None;

    for (line_index, line) in lines.into_iter().enumerate() {
        match classify(line) {
            LineKind::EstimatedTime(raw) => {
                let secs = parse_duration(raw)?.total_secs().ok_or_else(|| {
                    CooldownError::InvalidTimeValue(format!("'{}' overflows seconds", raw))
                })?;
                debug!(line_index, raw, secs, "found estimated printing time");
                return Ok(Detected {
                    estimate: TimeEstimate(secs),
                    format: TimeFormat::EstimatedPrintingTime,
                    line_index,
                });
            }
            LineKind::TimeTag(raw) if first_tag.is_none() => {
                first_tag = Some((line_index, raw));
            }
            _ => {}
        }
    }

    let (line_index, raw) = first_tag.ok_or(CooldownError::UnrecognizedTimeFormat)?;
    let secs = parse_seconds(raw)?;
    debug!(line_index, raw, secs, "found TIME tag");

    Ok(Detected {
        estimate: TimeEstimate(secs),
        format: TimeFormat::TimeTag,
        line_index,
    })
}

/// Detect the estimate in `text` and optionally write its counterpart.
pub fn normalize(text: &str, cross_write: bool) -> Result<Normalized> {
    let detected = detect(text.split_inclusive('\n'))?;

    let text = if cross_write {
        insert_counterpart(text, &detected)
    } else {
        text.to_string()
    };

    Ok(Normalized {
        estimate: detected.estimate,
        format: detected.format,
        line_index: detected.line_index,
        text,
    })
}

fn parse_seconds(raw: &str) -> Result<u64> {
    let invalid = |reason: &str| {
        CooldownError::InvalidTimeValue(format!("TIME value '{}' {}", raw, reason))
    };

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("is not a non-negative integer"));
    }
    raw.parse().map_err(|_| invalid("is too large"))
}

// The TIME tag goes above the estimate comment; the estimate comment goes
// below the TIME tag. Both reuse the matched line's ending.
fn insert_counterpart(text: &str, detected: &Detected) -> String {
    let mut out = String::with_capacity(text.len() + 64);

    for (index, line) in text.split_inclusive('\n').enumerate() {
        if index != detected.line_index {
            out.push_str(line);
            continue;
        }

        let (_, ending) = split_line_ending(line);
        match detected.format {
            TimeFormat::EstimatedPrintingTime => {
                out.push_str(&detected.estimate.tag_line());
                out.push_str(if ending.is_empty() { "\n" } else { ending });
                out.push_str(line);
            }
            TimeFormat::TimeTag => {
                out.push_str(line);
                if ending.is_empty() {
                    out.push('\n');
                }
                out.push_str(&detected.estimate.estimate_line());
                out.push_str(ending);
            }
        }
    }

    out
}
