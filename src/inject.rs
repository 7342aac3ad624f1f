//! Bed cooldown command generation and insertion.

use crate::error::{CooldownError, Result};
use crate::gcode::line::{LineKind, classify, is_first_layer, split_line_ending};
use crate::params::ParameterSet;

/// Macro called by the standalone filter.
pub const STANDALONE_COMMAND: &str = "ENABLE_BED_COOLDOWN";
/// Macro called by the slicer plugin.
pub const PLUGIN_COMMAND: &str = "INIT_BED_COOLDOWN";

/// `<NAME> SLICER_TIME_ESTIMATED=.. ELAPSED_TIME_THRESHOLD=.. ... DEBUG=..`
pub fn command_line(name: &str, params: &ParameterSet) -> String {
    let mut command = name.to_string();
    for (key, value) in params.pairs() {
        command.push(' ');
        command.push_str(key.name());
        command.push('=');
        command.push_str(&value);
    }
    command
}

/// Replace every `;ENABLE_BED_COOLDOWN` line with `command`.
///
/// Returns the new text and the number of replaced lines.
pub fn replace_enable_markers(text: &str, command: &str) -> Result<(String, usize)> {
    let mut out = String::with_capacity(text.len() + command.len());
    let mut replaced = 0;

    for line in text.split_inclusive('\n') {
        if classify(line) == LineKind::EnableMarker {
            let (_, ending) = split_line_ending(line);
            out.push_str(command);
            out.push_str(ending);
            replaced += 1;
        } else {
            out.push_str(line);
        }
    }

    if replaced == 0 {
        return Err(CooldownError::MissingEnableMarker);
    }
    Ok((out, replaced))
}

/// Insert `command` right after the `;LAYER:0` line opening `segment`.
///
/// Returns `None` when the segment does not start with that anchor.
pub fn insert_after_first_layer(segment: &str, command: &str) -> Option<String> {
    let anchor = segment.split_inclusive('\n').next()?;
    if !is_first_layer(anchor) {
        return None;
    }

    let (_, ending) = split_line_ending(anchor);
    let rest = &segment[anchor.len()..];

    let mut out = String::with_capacity(segment.len() + command.len() + 2);
    out.push_str(anchor);
    if ending.is_empty() {
        out.push('\n');
    }
    out.push_str(command);
    out.push_str(ending);
    out.push_str(rest);
    Some(out)
}

/// Apply [`insert_after_first_layer`] to every segment.
///
/// Returns the segments and how many of them received the command.
pub fn inject_segments(segments: &[String], command: &str) -> (Vec<String>, usize) {
    let mut injected = 0;
    let segments = segments
        .iter()
        .map(|segment| match insert_after_first_layer(segment, command) {
            Some(updated) => {
                injected += 1;
                updated
            }
            None => segment.clone(),
        })
        .collect();
    (segments, injected)
}
