use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::ChartTheme;

/// Looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "coil-thickness.json";

pub const ENV_CHART_DIR: &str = "COIL_CHART_DIR";
pub const ENV_SPREADSHEET: &str = "COIL_SPREADSHEET";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving the rendered charts.
    pub chart_dir: PathBuf,
    /// CSV workbook receiving one row per inspection.
    pub spreadsheet: PathBuf,
    /// Empty point fields shown on a fresh form.
    pub default_points: usize,
    pub chart: ChartConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chart_dir: PathBuf::from("static"),
            spreadsheet: PathBuf::from("dados.csv"),
            default_points: 8,
            chart: ChartConfig::default(),
        }
    }
}

/// Geometry and presentation constants for the polar chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Figure size in SVG user units.
    pub width: f64,
    pub height: f64,
    /// Raster scale applied when exporting the PNG.
    pub scale: f64,
    /// Added below the lowest and above the highest value on the radial axis (mm).
    pub axis_margin: f64,
    /// Radial distance between a point and its value label (mm).
    pub label_offset: f64,
    /// Number of grid intervals on the radial axis.
    pub grid_rings: usize,
    pub theme: ChartTheme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1800.0,
            height: 1500.0,
            scale: 1.0,
            axis_margin: 0.002,
            label_offset: 0.003,
            grid_rings: 5,
            theme: ChartTheme::default(),
        }
    }
}

impl AppConfig {
    /// Read `path` if it exists, else defaults; then apply env overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        } else {
            AppConfig::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_CHART_DIR).filter(|v| !v.is_empty()) {
            self.chart_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup(ENV_SPREADSHEET).filter(|v| !v.is_empty()) {
            self.spreadsheet = PathBuf::from(file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg.chart.axis_margin, 0.002);
        assert_eq!(cfg.default_points, 8);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"chart_dir": "out", "chart": {"axis_margin": 0.005}}"#).unwrap();
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.chart.axis_margin, 0.005);
        assert_eq!(cfg.chart.label_offset, 0.003);

        let raw: AppConfig = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.chart_dir, PathBuf::from("out"));
        assert_eq!(raw.spreadsheet, PathBuf::from("dados.csv"));
    }

    #[test]
    fn env_overrides_paths() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(|key| match key {
            ENV_CHART_DIR => Some("/tmp/charts".into()),
            ENV_SPREADSHEET => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.chart_dir, PathBuf::from("/tmp/charts"));
        assert_eq!(cfg.spreadsheet, PathBuf::from("dados.csv"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
