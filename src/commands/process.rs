use crate::config::Config;
use crate::gcode::{join_segments, split_layers};
use crate::inject::{command_line, replace_enable_markers};
use crate::params::{ParamKey, ParamOverrides, ParameterSet, STANDALONE_SCHEMA};
use crate::plugin::{self, TracingSink};
use crate::time::{self, TimeEstimate, TimeFormat};
use crate::{Mode, OutputFormat, platform};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ProcessOptions {
    pub mode: Mode,
    pub cross_write: bool,
    pub dry_run: bool,
}

/// Outcome of processing one file.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub path: PathBuf,
    pub mode: Mode,
    pub time_format: TimeFormat,
    pub estimate_secs: TimeEstimate,
    pub estimate: String,
    pub params: ParameterSet,
    pub command: String,
    /// Markers replaced (standalone) or layers injected (layers mode).
    pub insertions: usize,
    pub written: bool,
}

/// Process one G-code file in place.
///
/// `args` are the `KEY=VALUE` tokens; they win over the config file. The
/// file is only written once everything has been validated.
pub fn run(config: &Config, path: &Path, args: &[String], options: ProcessOptions) -> Result<Report> {
    let content = platform::read_gcode(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let overrides = config.overrides().merge(ParamOverrides::from_args(args));

    let normalized = time::normalize(&content, options.cross_write)?;
    info!(
        estimate = normalized.estimate.as_secs(),
        format = %normalized.format,
        "detected print time estimate"
    );
    warn_on_ignored_estimate(&overrides, normalized.estimate);

    let (text, params, command, insertions) = match options.mode {
        Mode::Standalone => {
            let params =
                ParameterSet::resolve(normalized.estimate, &overrides, &STANDALONE_SCHEMA)?;
            let command = command_line(&config.output.standalone_command, &params);
            let (text, replaced) = replace_enable_markers(&normalized.text, &command)?;
            (text, params, command, replaced)
        }
        Mode::Layers => {
            let segments = split_layers(&normalized.text);
            let plugin_run = plugin::execute_with(
                &segments,
                &overrides,
                &config.output.plugin_command,
                &mut TracingSink,
            )?;
            (
                join_segments(&plugin_run.segments),
                plugin_run.params,
                plugin_run.command,
                plugin_run.injected,
            )
        }
    };

    if !options.dry_run {
        platform::write_atomic(path, &text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(Report {
        path: path.to_path_buf(),
        mode: options.mode,
        time_format: normalized.format,
        estimate_secs: normalized.estimate,
        estimate: normalized.estimate.formatted(),
        params,
        command,
        insertions,
        written: !options.dry_run,
    })
}

pub fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let params = serde_json::to_string(&report.params).context("Failed to serialize parameters")?;
            println!("{}", params);
            println!(
                "Estimated print time: {} ({} s, from {})",
                report.estimate, report.estimate_secs, report.time_format
            );
            println!("Command: {}", report.command);
            if report.written {
                println!(
                    "✓ Updated {} ({} insertion(s))",
                    report.path.display(),
                    report.insertions
                );
            } else {
                println!(
                    "[DRY-RUN] Would update {} ({} insertion(s))",
                    report.path.display(),
                    report.insertions
                );
            }
        }
    }
    Ok(())
}

fn warn_on_ignored_estimate(overrides: &ParamOverrides, estimate: TimeEstimate) {
    if let Some(given) = overrides.get(ParamKey::SlicerTimeEstimated) {
        if given.trim() != estimate.to_string() {
            warn!(
                given,
                derived = estimate.as_secs(),
                "SLICER_TIME_ESTIMATED is taken from the G-code, ignoring the given value"
            );
        }
    }
}
