//! Platform-specific paths for the engine config and state library.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/diffuse/` (Linux), `~/Library/Application Support/diffuse/` (macOS), `%APPDATA%\diffuse\` (Windows)
//! - **Engine config**: `<user config>/engine.toml`
//! - **State library**: `<user config>/states.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use diffuse_config::paths;
//!
//! let library = paths::default_library_path();
//! println!("State library: {:?}", library);
//! ```

use std::path::{Path, PathBuf};

/// Application name used for directory paths.
const APP_NAME: &str = "diffuse";

/// File name of the default engine config.
const CONFIG_FILE: &str = "engine.toml";

/// File name of the default state library.
const LIBRARY_FILE: &str = "states.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default engine config file.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Default state library file.
pub fn default_library_path() -> PathBuf {
    user_config_dir().join(LIBRARY_FILE)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();
    ensure_parent_dir(&dir.join(CONFIG_FILE))?;
    Ok(dir)
}

/// Creates the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), crate::ConfigError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| crate::ConfigError::create_dir(parent, e))
        }
        _ => Ok(()),
    }
}
