//! Slicer plugin entry point.
//!
//! The host slicer hands over its G-code as a list of segments (a header
//! block followed by one segment per layer) together with the values of the
//! settings declared in [`settings_schema`]. The command is inserted right
//! after the `;LAYER:0` comment and the segments are handed back. Hosts
//! collect diagnostics through a [`DebugSink`].

use crate::error::Result;
use crate::inject::{PLUGIN_COMMAND, command_line, inject_segments};
use crate::params::{
    Constraint, PLUGIN_SCHEMA, ParamKey, ParamOverrides, ParameterSet, ProgressType,
};
use crate::time::{Detected, detect};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

/// Line-oriented debug log provided by the host.
pub trait DebugSink {
    fn debug(&mut self, line: &str);
}

/// Forwards host log lines to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn debug(&mut self, line: &str) {
        tracing::debug!(target: "bed_cooldown::plugin", "{}", line);
    }
}

impl DebugSink for Vec<String> {
    fn debug(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Setting values as stored by the host. Unset values use the plugin
/// schema defaults; ranges are checked when the parameters are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub elapsed: Option<i64>,
    #[serde(default)]
    pub remain: Option<i64>,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub progresstype: Option<String>,
    #[serde(default)]
    pub temperature: Option<i64>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl From<&PluginSettings> for ParamOverrides {
    fn from(settings: &PluginSettings) -> Self {
        ParamOverrides {
            slicer_time_estimated: None,
            elapsed_time_threshold: settings.elapsed.map(|v| v.to_string()),
            remain_time_threshold: settings.remain.map(|v| v.to_string()),
            progress_threshold: settings.progress.map(|v| v.to_string()),
            progress_type: settings.progresstype.clone(),
            target_temp: settings.temperature.map(|v| v.to_string()),
            debug: settings.debug.map(|v| v.to_string()),
        }
    }
}

/// Everything a plugin run produced.
#[derive(Debug, Clone)]
pub struct PluginRun {
    pub segments: Vec<String>,
    pub detected: Detected,
    pub params: ParameterSet,
    pub command: String,
    /// Number of segments that received the command.
    pub injected: usize,
}

/// Host entry point: process `segments` with the default command name.
pub fn execute(
    segments: &[String],
    settings: &PluginSettings,
    sink: &mut impl DebugSink,
) -> Result<Vec<String>> {
    execute_with(
        segments,
        &ParamOverrides::from(settings),
        PLUGIN_COMMAND,
        sink,
    )
    .map(|run| run.segments)
}

/// Process `segments` with already collected overrides.
pub fn execute_with(
    segments: &[String],
    overrides: &ParamOverrides,
    command_name: &str,
    sink: &mut impl DebugSink,
) -> Result<PluginRun> {
    let detected = detect(segments.iter().flat_map(|s| s.split_inclusive('\n')))?;
    if let Some((layer, line, text)) = locate(segments, detected.line_index) {
        sink.debug(&format!("Found slicer_time ({})", detected.format));
        sink.debug(&format!("Layer {}, Line {}: {}", layer, line, text.trim_end()));
    }

    let params = ParameterSet::resolve(detected.estimate, overrides, &PLUGIN_SCHEMA)?;
    let command = command_line(command_name, &params);
    let (segments, injected) = inject_segments(segments, &command);

    if injected == 0 {
        warn!("no ;LAYER:0 segment found, G-code left unchanged");
    }

    report(sink, &params, &command);

    Ok(PluginRun {
        segments,
        detected,
        params,
        command,
        injected,
    })
}

fn report(sink: &mut impl DebugSink, params: &ParameterSet, command: &str) {
    let lines = [
        String::new(),
        "BedCooldown".to_string(),
        String::new(),
        format!("slicer_time:            {}", params.slicer_time_estimated),
        format!("ELAPSED_TIME_THRESHOLD: {}", params.elapsed_time_threshold),
        format!("REMAIN_TIME_THRESHOLD:  {}", params.remain_time_threshold),
        format!("PROGRESS_THRESHOLD:     {}", params.progress_threshold),
        format!("TARGET_TEMP:            {}", params.target_temp),
        String::new(),
        format!("bed_cooldown_command:   {}", command),
        String::new(),
    ];
    for line in &lines {
        sink.debug(line);
    }
}

// Segment index, line index within it, and the line itself.
fn locate(segments: &[String], line_index: usize) -> Option<(usize, usize, &str)> {
    let mut remaining = line_index;
    for (segment_index, segment) in segments.iter().enumerate() {
        let count = segment.split_inclusive('\n').count();
        if remaining < count {
            let line = segment.split_inclusive('\n').nth(remaining)?;
            return Some((segment_index, remaining, line));
        }
        remaining -= count;
    }
    None
}

/// Settings definition handed to the host, in its JSON settings format.
pub fn settings_schema() -> Value {
    let options: serde_json::Map<String, Value> = ProgressType::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), Value::from(p.as_str())))
        .collect();
    let debug_default = default_of(ParamKey::Debug) == "true";

    json!({
        "name": "Bed Cooldown",
        "key": "BedCooldown",
        "metadata": {},
        "version": 2,
        "settings": {
            "elapsed": int_setting(
                ParamKey::ElapsedTimeThreshold,
                "Time elapsed threshold >",
                "Time [s] which has to be elapsed to activate cooldown",
                "s",
                &[],
            ),
            "remain": int_setting(
                ParamKey::RemainTimeThreshold,
                "Time remain threshold <",
                "Time [s] remaining until end of print to activate cooldown",
                "s",
                &[("maximum_value_warning", "1801")],
            ),
            "progress": int_setting(
                ParamKey::ProgressThreshold,
                "Progress threshold >",
                "Progress [%] threshold to activate cooldown",
                "%",
                &[("minimum_value_warning", "49")],
            ),
            "progresstype": {
                "label": "Progress type",
                "description": "Progress type [virtual_sdcard, display_status, time]. \
                    virtual_sdcard = The progress value of the last M73 G-Code command \
                    (or virtual_sdcard.progress if no recent M73 received). \
                    display_status = An estimate of the current print progress \
                    (based of file size and file position). \
                    time = Elapsed time / Slicer Estimated Time * 100",
                "type": "enum",
                "options": options,
                "default_value": default_of(ParamKey::ProgressType),
            },
            "temperature": int_setting(
                ParamKey::TargetTemp,
                "Target temperature",
                "Target temperature [°C] to cooldown to",
                "°C",
                &[("maximum_value_warning", "20")],
            ),
            "debug": {
                "label": "Debug Mode",
                "description": "Extended printing to console (M118)",
                "type": "bool",
                "default_value": debug_default,
            }
        }
    })
}

fn default_of(key: ParamKey) -> &'static str {
    PLUGIN_SCHEMA.rule(key).map(|r| r.default).unwrap_or("")
}

fn int_setting(
    key: ParamKey,
    label: &str,
    description: &str,
    unit: &str,
    warnings: &[(&str, &str)],
) -> Value {
    let mut setting = json!({
        "label": label,
        "description": description,
        "unit": unit,
        "type": "int",
        "default_value": default_of(key),
    });

    if let Some(Constraint::Integer { min, max }) = PLUGIN_SCHEMA.rule(key).map(|r| r.constraint) {
        setting["minimum_value"] = Value::from(min.to_string());
        if let Some(max) = max {
            setting["maximum_value"] = Value::from(max.to_string());
        }
    }
    for (name, value) in warnings {
        setting[*name] = Value::from(*value);
    }

    setting
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CooldownError;

    fn cura_segments() -> Vec<String> {
        vec![
            ";FLAVOR:Marlin\n;TIME:6666\n;Generated with Cura\n".to_string(),
            ";LAYER:0\nG1 X1 Y1\n".to_string(),
            ";LAYER:1\nG1 X2 Y2\n".to_string(),
        ]
    }

    #[test]
    fn test_execute_inserts_after_layer_zero() {
        let mut log: Vec<String> = Vec::new();
        let out = execute(&cura_segments(), &PluginSettings::default(), &mut log).unwrap();

        assert_eq!(out[0], cura_segments()[0]);
        assert_eq!(
            out[1],
            ";LAYER:0\nINIT_BED_COOLDOWN SLICER_TIME_ESTIMATED=6666 ELAPSED_TIME_THRESHOLD=901 \
             REMAIN_TIME_THRESHOLD=901 PROGRESS_THRESHOLD=75 PROGRESS_TYPE=time TARGET_TEMP=0 \
             DEBUG=false\nG1 X1 Y1\n"
        );
        assert_eq!(out[2], cura_segments()[2]);
    }

    #[test]
    fn test_execute_logs_diagnostics() {
        let mut log: Vec<String> = Vec::new();
        let settings = PluginSettings {
            remain: Some(300),
            ..Default::default()
        };
        execute(&cura_segments(), &settings, &mut log).unwrap();

        assert!(log.iter().any(|l| l == "Layer 0, Line 1: ;TIME:6666"));
        assert!(log.iter().any(|l| l == "slicer_time:            6666"));
        assert!(log.iter().any(|l| l == "REMAIN_TIME_THRESHOLD:  300"));
        assert!(log.iter().any(|l| l.starts_with("bed_cooldown_command:   INIT_BED_COOLDOWN")));
    }

    #[test]
    fn test_execute_without_anchor_returns_segments_unchanged() {
        let segments = vec![";TIME:10\nG28\n".to_string()];
        let out = execute(&segments, &PluginSettings::default(), &mut Vec::<String>::new()).unwrap();
        assert_eq!(out, segments);
    }

    #[test]
    fn test_execute_without_estimate_fails() {
        let segments = vec![";LAYER:0\nG28\n".to_string()];
        let result = execute(&segments, &PluginSettings::default(), &mut Vec::<String>::new());
        assert!(matches!(result, Err(CooldownError::UnrecognizedTimeFormat)));
    }

    #[test]
    fn test_execute_rejects_out_of_range_setting() {
        let settings = PluginSettings {
            temperature: Some(120),
            ..Default::default()
        };
        let result = execute(&cura_segments(), &settings, &mut Vec::<String>::new());
        assert!(matches!(result, Err(CooldownError::ParameterValidation { .. })));
    }

    #[test]
    fn test_settings_deserialize_from_host_json() {
        let settings: PluginSettings =
            serde_json::from_str(r#"{"elapsed": 600, "progresstype": "display_status", "debug": true}"#)
                .unwrap();
        assert_eq!(settings.elapsed, Some(600));
        assert_eq!(settings.debug, Some(true));
        assert_eq!(settings.remain, None);
    }

    #[test]
    fn test_settings_schema_uses_plugin_limits() {
        let schema = settings_schema();
        let settings = &schema["settings"];

        assert_eq!(settings["elapsed"]["default_value"], "901");
        assert_eq!(settings["elapsed"]["maximum_value"], "604800");
        assert_eq!(settings["temperature"]["maximum_value"], "95");
        assert_eq!(settings["progress"]["minimum_value_warning"], "49");
        assert_eq!(settings["progresstype"]["options"]["display_status"], "display_status");
        assert_eq!(settings["debug"]["default_value"], false);
    }
}
