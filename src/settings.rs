use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "paperloom";

/// Heuristic thresholds. None of these have a derivation behind them;
/// they are tunable per installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Noise floor for drag-selected regions, render pixels
    #[serde(default = "default_region_min")]
    pub region_min_width: f64,
    #[serde(default = "default_region_min")]
    pub region_min_height: f64,

    /// Noise floor for native text-line rectangles, render pixels
    #[serde(default = "default_text_min_width")]
    pub text_min_width: f64,
    #[serde(default = "default_text_min_height")]
    pub text_min_height: f64,

    /// Selections covering more of the page than this are discarded
    #[serde(default = "default_max_page_coverage")]
    pub max_page_coverage: f64,

    /// Smallest accepted capture drag, render pixels
    #[serde(default = "default_capture_min")]
    pub capture_min_width: f64,
    #[serde(default = "default_capture_min")]
    pub capture_min_height: f64,

    #[serde(default = "default_emphasis_duration_ms")]
    pub emphasis_duration_ms: u64,

    #[serde(default = "default_min_selection_chars")]
    pub min_selection_chars: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_region_min() -> f64 {
    5.0
}

fn default_text_min_width() -> f64 {
    1.0
}

fn default_text_min_height() -> f64 {
    3.0
}

fn default_max_page_coverage() -> f64 {
    0.5
}

fn default_capture_min() -> f64 {
    20.0
}

fn default_emphasis_duration_ms() -> u64 {
    3000
}

fn default_min_selection_chars() -> usize {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            region_min_width: default_region_min(),
            region_min_height: default_region_min(),
            text_min_width: default_text_min_width(),
            text_min_height: default_text_min_height(),
            max_page_coverage: default_max_page_coverage(),
            capture_min_width: default_capture_min(),
            capture_min_height: default_capture_min(),
            emphasis_duration_ms: default_emphasis_duration_ms(),
            min_selection_chars: default_min_selection_chars(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML, migrating older versions
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut settings: Settings =
            serde_yaml::from_str(content).context("Failed to parse settings")?;
        if settings.version < CURRENT_VERSION {
            migrate_settings(&mut settings);
        }
        settings.sanitize();
        Ok(settings)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {path:?}"))?;
        Self::from_yaml(&content)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory {parent:?}"))?;
            }
        }
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Failed to save settings to {path:?}"))?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        let body = serde_yaml::to_string(self).context("Failed to serialize settings")?;
        Ok(format!("{SETTINGS_HEADER}{body}"))
    }

    /// Replace nonsensical values with defaults
    fn sanitize(&mut self) {
        let defaults = Settings::default();
        if !(self.max_page_coverage > 0.0 && self.max_page_coverage <= 1.0) {
            warn!(
                "max_page_coverage {} out of range, using {}",
                self.max_page_coverage, defaults.max_page_coverage
            );
            self.max_page_coverage = defaults.max_page_coverage;
        }
        for (value, default) in [
            (&mut self.region_min_width, defaults.region_min_width),
            (&mut self.region_min_height, defaults.region_min_height),
            (&mut self.text_min_width, defaults.text_min_width),
            (&mut self.text_min_height, defaults.text_min_height),
            (&mut self.capture_min_width, defaults.capture_min_width),
            (&mut self.capture_min_height, defaults.capture_min_height),
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = default;
            }
        }
    }
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# paperloom selection heuristics
# ============================================================================
# All sizes are render-space pixels at the zoom level active when the
# selection is made. max_page_coverage is a fraction of the page area.

"#;

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the default location, creating the file with
/// defaults when it does not exist yet
pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Err(e) = current().save_to_path(&path) {
            error!("{e:#}");
        }
    }
}

/// Load settings from `path` into the process-wide settings. Failures
/// are logged and leave the current settings untouched.
pub fn load_settings_from_path(path: &Path) {
    match Settings::load_from_path(path) {
        Ok(settings) => {
            debug!("Loaded settings from {path:?}");
            install(settings);
        }
        Err(e) => error!("{e:#}"),
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

/// Snapshot of the process-wide settings
pub fn current() -> Settings {
    SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default()
}

/// Replace the process-wide settings
pub fn install(settings: Settings) {
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::from_yaml("version: 1\nregion_min_width: 8\n").unwrap();
        assert_eq!(settings.region_min_width, 8.0);
        assert_eq!(settings.region_min_height, 5.0);
        assert_eq!(settings.max_page_coverage, 0.5);
        assert_eq!(settings.emphasis_duration_ms, 3000);
    }

    #[test]
    fn old_version_is_migrated() {
        let settings = Settings::from_yaml("version: 0\n").unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
    }

    #[test]
    fn out_of_range_values_are_reset() {
        let settings =
            Settings::from_yaml("max_page_coverage: 3.5\ncapture_min_width: -2\n").unwrap();
        assert_eq!(settings.max_page_coverage, 0.5);
        assert_eq!(settings.capture_min_width, 20.0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILENAME);
        let settings = Settings {
            capture_min_width: 32.0,
            emphasis_duration_ms: 1500,
            ..Settings::default()
        };
        settings.save_to_path(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# ===="));
        assert_eq!(Settings::load_from_path(&path).unwrap(), settings);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(Settings::load_from_path(&path).is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(Settings::from_yaml("region_min_width: [oops").is_err());
    }
}
