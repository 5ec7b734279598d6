mod config;
pub mod templates;

pub use config::{Config, DisplayConfig, PreferencesConfig, TimerConfig};
pub use templates::{ConfigurationSource, TemplateStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the application data directory.
///
/// `ZENITH_HOME` overrides the location outright. Otherwise this is
/// `~/.config/zenith[-dev]/`, with `ZENITH_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("ZENITH_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("ZENITH_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("zenith-dev")
            } else {
                base_dir.join("zenith")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
