// Persistent application configuration

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::TrackpaintError;
use crate::laps::CompoundColors;
use crate::path::NamedPalette;
use crate::render::SvgRenderConfig;
use crate::telemetry::QuickLapFilter;

const CONFIG_DIR_NAME: &str = "trackpaint";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the JSON-lines session tree
    pub data_dir: PathBuf,
    pub render: SvgRenderConfig,
    pub gear_palette: NamedPalette,
    pub speed_palette: NamedPalette,
    /// Compound name to "#rrggbb", applied on top of the default colors
    pub compound_colors: HashMap<String, String>,
    pub quick_lap_threshold: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            render: SvgRenderConfig::default(),
            gear_palette: NamedPalette::Paired,
            speed_palette: NamedPalette::Plasma,
            compound_colors: HashMap::new(),
            quick_lap_threshold: QuickLapFilter::default().threshold,
        }
    }
}

impl AppConfig {
    /// Location of the config file in the user's config directory
    pub fn default_path() -> Result<PathBuf, TrackpaintError> {
        Ok(dirs::config_dir()
            .ok_or(TrackpaintError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the config from the user's config directory, `None` if there is none yet
    pub fn from_local_file() -> Result<Option<Self>, TrackpaintError> {
        let config_path = Self::default_path()?;
        if config_path.exists() {
            Self::from_path(&config_path).map(Some)
        } else {
            debug!("No config file at {:?}", config_path);
            Ok(None)
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, TrackpaintError> {
        let file = File::open(path).map_err(|e| TrackpaintError::ConfigIOError { source: e })?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| TrackpaintError::ConfigSerializeError { source: e })?;
        config.validate()?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save(&self) -> Result<(), TrackpaintError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TrackpaintError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| TrackpaintError::ConfigIOError { source: e })?;
        }

        let file = File::create(path).map_err(|e| TrackpaintError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| TrackpaintError::ConfigSerializeError { source: e })
    }

    pub fn compound_colors(&self) -> Result<CompoundColors, TrackpaintError> {
        CompoundColors::with_hex_overrides(&self.compound_colors)
    }

    /// The threshold must be finite and at least 1, anything lower drops every lap
    pub fn validate(&self) -> Result<(), TrackpaintError> {
        if !self.quick_lap_threshold.is_finite() || self.quick_lap_threshold < 1.0 {
            return Err(TrackpaintError::InvalidConfig {
                reason: format!(
                    "quick_lap_threshold is {}, expected a finite value of at least 1.0",
                    self.quick_lap_threshold
                ),
            });
        }
        Ok(())
    }

    pub fn quick_lap_filter(&self) -> Result<QuickLapFilter, TrackpaintError> {
        self.validate()?;
        Ok(QuickLapFilter::new(self.quick_lap_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = AppConfig::default();
        config.speed_palette = NamedPalette::Viridis;
        config.compound_colors.insert("SOFT".to_string(), "#FF0000".to_string());
        config.save_to(&path).unwrap();

        let loaded = AppConfig::from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"quick_lap_threshold": 1.1}"#).unwrap();

        let loaded = AppConfig::from_path(&path).unwrap();
        assert_eq!(loaded.quick_lap_threshold, 1.1);
        assert_eq!(loaded.gear_palette, NamedPalette::Paired);
        assert_eq!(loaded.render, SvgRenderConfig::default());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::from_path(&path),
            Err(TrackpaintError::ConfigSerializeError { .. })
        ));
    }

    #[test]
    fn test_quick_lap_threshold_validated() {
        assert_eq!(
            AppConfig::default().quick_lap_filter().unwrap(),
            QuickLapFilter::default()
        );

        for threshold in [0.5, f32::NAN, f32::INFINITY] {
            let config = AppConfig {
                quick_lap_threshold: threshold,
                ..Default::default()
            };
            assert!(matches!(
                config.quick_lap_filter(),
                Err(TrackpaintError::InvalidConfig { .. })
            ));
        }

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"quick_lap_threshold": 0.5}"#).unwrap();
        assert!(matches!(
            AppConfig::from_path(&path),
            Err(TrackpaintError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_compound_color_overrides() {
        let mut config = AppConfig::default();
        config.compound_colors.insert("HYPERSOFT".to_string(), "#FFC0CB".to_string());
        let colors = config.compound_colors().unwrap();
        assert!(colors.contains("HYPERSOFT"));
        assert!(colors.contains("SOFT"));
    }
}
