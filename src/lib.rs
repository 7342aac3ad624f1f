pub mod commands;
pub mod config;
pub mod error;
pub mod gcode;
pub mod inject;
pub mod params;
pub mod platform;
pub mod plugin;
pub mod time;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Where the command goes.
#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Replace the `;ENABLE_BED_COOLDOWN` line (OrcaSlicer, PrusaSlicer).
    #[default]
    Standalone,
    /// Insert after `;LAYER:0`, as the Cura plugin does.
    Layers,
}
