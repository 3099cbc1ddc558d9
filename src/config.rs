//! Host configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORE_DIR: &str = "./cardsmith-data";
pub const DEFAULT_AUTOSAVE_MS: u64 = 400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Root of the template store and the autosave slot.
    pub store_dir: PathBuf,
    /// Quiet period before a scheduled autosave is written.
    pub autosave_ms: u64,
    /// Directory of extra `.ttf` / `.otf` faces; the bundled face is always available.
    pub font_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { store_dir: PathBuf::from(DEFAULT_STORE_DIR), autosave_ms: DEFAULT_AUTOSAVE_MS, font_dir: None }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `CARDSMITH_STORE_DIR`: default `./cardsmith-data`
    /// - `CARDSMITH_AUTOSAVE_MS`: default 400
    /// - `CARDSMITH_FONT_DIR`: unset by default
    #[must_use]
    pub fn from_env() -> Self {
        let store_dir = env_path("CARDSMITH_STORE_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));
        let autosave_ms = env_parse("CARDSMITH_AUTOSAVE_MS", DEFAULT_AUTOSAVE_MS);
        let font_dir = env_path("CARDSMITH_FONT_DIR");
        Self { store_dir, autosave_ms, font_dir }
    }

    #[must_use]
    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_ms)
    }
}

pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
