use anyhow::{Context, Result};
use bed_cooldown::commands;
use bed_cooldown::commands::process::ProcessOptions;
use bed_cooldown::config;
use bed_cooldown::{Mode, OutputFormat};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bed-cooldown")]
#[command(about = "Insert a bed cooldown trigger into sliced G-code")]
#[command(version)]
#[command(
    after_help = "Example: bed-cooldown REMAIN_TIME_THRESHOLD=300 DEBUG=true /path/to/file.gcode\n\
                  Options go before the KEY=VALUE arguments."
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Standalone, help = "Where to put the command")]
    mode: Mode,

    #[arg(long, help = "Config file (default: ~/.bed-cooldown/config.toml if present)")]
    config: Option<PathBuf>,

    #[arg(long, help = "Do not write the missing print time format")]
    no_cross_write: bool,

    #[arg(long, help = "Preview without writing the file")]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help = "Report format")]
    format: OutputFormat,

    #[arg(long, default_value = "warn", help = "Log level (trace, debug, info, warn, error)")]
    log_level: String,

    #[arg(long, help = "Print the slicer plugin settings schema and exit")]
    print_schema: bool,

    #[arg(long, help = "Print the effective configuration and exit")]
    show_config: bool,

    #[arg(
        value_name = "KEY=VALUE ... PATH",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present_any = ["print_schema", "show_config"],
        help = "Parameter overrides followed by the G-code file"
    )]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.print_schema {
        return commands::config::schema();
    }

    let config = config::load(cli.config.as_deref())?;

    if cli.show_config {
        return commands::config::show(&config);
    }

    let (path, overrides) = cli
        .args
        .split_last()
        .context("Missing path to the G-code file")?;

    let options = ProcessOptions {
        mode: cli.mode,
        cross_write: config.output.cross_write && !cli.no_cross_write,
        dry_run: cli.dry_run,
    };

    let report = commands::process::run(&config, Path::new(path), overrides, options)?;
    commands::process::print_report(&report, cli.format)?;

    Ok(())
}
