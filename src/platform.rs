//! Filesystem helpers: config directory resolution and in-place rewrites.
//!
//! G-code files are rewritten by writing a sibling temporary file and
//! renaming it over the original, so an interrupted run never leaves a
//! half-written file behind.

use crate::error::{CooldownError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".bed-cooldown";
const CONFIG_FILE: &str = "config.toml";

/// Default config file location (`~/.bed-cooldown/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Fail with `InvalidPath` unless `path` is an existing regular file.
pub fn ensure_regular_file(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(CooldownError::InvalidPath(path.to_path_buf())),
    }
}

pub fn read_gcode(path: &Path) -> Result<String> {
    ensure_regular_file(path)?;
    Ok(fs::read_to_string(path)?)
}

/// Replace the contents of `path` with `content` via temp file + rename.
///
/// The temporary file gets the original's permissions. It is removed again
/// if anything fails before the rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);

    let result = (|| -> Result<()> {
        fs::write(&temp_path, content)?;
        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(&temp_path, meta.permissions())?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bed-cooldown.tmp");
    path.with_file_name(name)
}
