//! Platform-specific path for the user's config file.
//!
//! - Linux: `~/.config/malla/malla.toml`
//! - macOS: `~/Library/Application Support/malla/malla.toml`
//! - Windows: `%APPDATA%\malla\malla.toml`

use std::path::PathBuf;

const APP_NAME: &str = "malla";
const CONFIG_FILE: &str = "malla.toml";

/// The user-specific config directory, falling back to `.` if the
/// platform config directory can't be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// The user-specific config file's default path.
pub fn user_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Ensure the user config directory exists, creating it if necessary.
pub fn ensure_user_config_dir() -> crate::Result<PathBuf> {
    let dir = user_config_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_config_dir_names_the_app() {
        let dir = user_config_dir();
        assert!(dir.to_string_lossy().contains("malla"));
    }

    #[test]
    fn user_config_path_ends_in_the_config_file() {
        assert_eq!(
            user_config_path().file_name().unwrap().to_str().unwrap(),
            "malla.toml"
        );
    }

    #[test]
    fn ensure_user_config_dir_does_not_panic() {
        let _ = ensure_user_config_dir();
    }
}
