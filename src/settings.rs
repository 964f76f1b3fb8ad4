//! Preferences management for Iris
//!
//! Handles the persistent settings file:
//! - Random blink on/off
//! - Sleepy mode on/off
//! - Refresh rate (tick interval in milliseconds)
//! - Start at login

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default tick interval (40 FPS).
pub const DEFAULT_REFRESH_RATE_MS: u64 = 25;

/// Refresh speed choices surfaced in the tray menu.
pub const REFRESH_SPEEDS: &[(&str, u64)] = &[("Slow", 200), ("Normal", 50), ("Fast", 25)];

/// Application preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Blink one eye at random every few seconds
    pub random_blink: bool,

    /// Drop the eyelids after a stretch of cursor inactivity
    pub sleepy_mode: bool,

    /// Tick interval in milliseconds. Always > 0.
    pub refresh_rate: u64,

    /// Whether to start at login
    pub start_at_login: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            random_blink: true,
            sleepy_mode: true,
            refresh_rate: DEFAULT_REFRESH_RATE_MS,
            start_at_login: false,
        }
    }
}

impl Preferences {
    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("Iris").join("settings.json"))
    }

    /// Load preferences from disk, healing the file if it is missing or
    /// unreadable: defaults are returned and written back in place.
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path. Any read or parse failure falls back to
    /// defaults and persists them, so the next run starts from a clean file.
    pub fn load_from(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Preferences>(&content).ok());

        match parsed {
            Some(mut prefs) => {
                if prefs.refresh_rate == 0 {
                    tracing::warn!("invalid refresh_rate 0 in settings, using default");
                    prefs.refresh_rate = DEFAULT_REFRESH_RATE_MS;
                }
                prefs
            }
            None => {
                let defaults = Self::default();
                if let Err(e) = defaults.save_to(path) {
                    tracing::warn!("could not rewrite settings file: {e:#}");
                }
                defaults
            }
        }
    }

    /// Save preferences to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine settings path"))?;
        self.save_to(&path)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        Ok(())
    }

    /// The tick interval derived from `refresh_rate`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.refresh_rate)
    }

    /// Set start at login (updates Windows registry)
    pub fn set_start_at_login(&mut self, enabled: bool) -> anyhow::Result<()> {
        self.start_at_login = enabled;

        #[cfg(target_os = "windows")]
        {
            use winreg::enums::*;
            use winreg::RegKey;

            let hkcu = RegKey::predef(HKEY_CURRENT_USER);
            let run_key = hkcu.open_subkey_with_flags(
                r"Software\Microsoft\Windows\CurrentVersion\Run",
                KEY_READ | KEY_WRITE,
            )?;

            if enabled {
                let exe_path = std::env::current_exe()?;
                let cmd = format!("\"{}\"", exe_path.to_string_lossy());
                run_key.set_value("Iris", &cmd)?;
            } else {
                // Remove the registry entry (ignore if it doesn't exist)
                let _ = run_key.delete_value("Iris");
            }
        }

        Ok(())
    }

    /// Check if start at login is actually enabled in registry
    #[cfg(target_os = "windows")]
    pub fn is_start_at_login_enabled() -> bool {
        use winreg::enums::*;
        use winreg::RegKey;

        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        if let Ok(run_key) = hkcu.open_subkey(r"Software\Microsoft\Windows\CurrentVersion\Run") {
            run_key.get_value::<String, _>("Iris").is_ok()
        } else {
            false
        }
    }

    #[cfg(not(target_os = "windows"))]
    pub fn is_start_at_login_enabled() -> bool {
        false
    }
}

/// Look up the menu label for a refresh rate, if it is one of the presets.
pub fn refresh_speed_label(rate_ms: u64) -> Option<&'static str> {
    REFRESH_SPEEDS
        .iter()
        .find(|(_, ms)| *ms == rate_ms)
        .map(|(label, _)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default() {
        let prefs = Preferences::default();
        assert!(prefs.random_blink);
        assert!(prefs.sleepy_mode);
        assert_eq!(prefs.refresh_rate, 25);
        assert!(!prefs.start_at_login);
    }

    #[test]
    fn test_missing_file_heals_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let prefs = Preferences::load_from(&path);
        assert_eq!(prefs, Preferences::default());

        // The defaults were written back.
        let content = std::fs::read_to_string(&path).unwrap();
        let reread: Preferences = serde_json::from_str(&content).unwrap();
        assert_eq!(reread, Preferences::default());
    }

    #[test]
    fn test_malformed_file_heals_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json at all").unwrap();

        let prefs = Preferences::load_from(&path);
        assert!(prefs.random_blink);
        assert!(prefs.sleepy_mode);
        assert_eq!(prefs.refresh_rate, 25);

        // The broken file was overwritten with the defaults.
        let reread = Preferences::load_from(&path);
        assert_eq!(reread, Preferences::default());
    }

    #[test]
    fn test_save_load_round_trip_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let prefs = Preferences {
            random_blink: false,
            sleepy_mode: true,
            refresh_rate: 200,
            start_at_login: false,
        };
        prefs.save_to(&path).unwrap();
        let first = std::fs::read(&path).unwrap();

        let loaded = Preferences::load_from(&path);
        assert_eq!(loaded, prefs);
        loaded.save_to(&path).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_refresh_rate_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"random_blink": true, "sleepy_mode": false, "refresh_rate": 0}"#,
        )
        .unwrap();

        let prefs = Preferences::load_from(&path);
        assert_eq!(prefs.refresh_rate, DEFAULT_REFRESH_RATE_MS);
        assert!(!prefs.sleepy_mode);
    }

    #[test]
    fn test_three_key_schema_still_loads() {
        // Files written before the start_at_login field existed.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"random_blink": false, "sleepy_mode": true, "refresh_rate": 50}"#,
        )
        .unwrap();

        let prefs = Preferences::load_from(&path);
        assert!(!prefs.random_blink);
        assert_eq!(prefs.refresh_rate, 50);
        assert!(!prefs.start_at_login);
    }

    #[test]
    fn test_refresh_speed_table() {
        assert_eq!(refresh_speed_label(200), Some("Slow"));
        assert_eq!(refresh_speed_label(50), Some("Normal"));
        assert_eq!(refresh_speed_label(25), Some("Fast"));
        assert_eq!(refresh_speed_label(42), None);
    }

    #[test]
    fn test_interval() {
        let prefs = Preferences { refresh_rate: 200, ..Default::default() };
        assert_eq!(prefs.interval(), Duration::from_millis(200));
    }
}
