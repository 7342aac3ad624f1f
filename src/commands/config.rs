use crate::config::Config;
use crate::plugin::settings_schema;
use anyhow::{Context, Result};

pub fn show(config: &Config) -> Result<()> {
    // Unset thresholds are omitted; the mode defaults apply to them
    let toml_str = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

pub fn schema() -> Result<()> {
    let json = serde_json::to_string_pretty(&settings_schema())
        .context("Failed to serialize settings schema")?;
    println!("{}", json);
    Ok(())
}
