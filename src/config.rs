//! Run configuration.
//!
//! Every field has a default pointing at the fixed dataset locations, so a
//! run without a configuration file reads `data/` and writes `output/`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub referendum: PathBuf,
    pub regions: PathBuf,
    pub departments: PathBuf,
    pub boundaries: PathBuf,
    /// GeoJSON property holding the region code.
    pub boundary_code_property: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            referendum: PathBuf::from("data/referendum.csv"),
            regions: PathBuf::from("data/regions.csv"),
            departments: PathBuf::from("data/departments.csv"),
            boundaries: PathBuf::from("data/regions.geojson"),
            boundary_code_property: "code".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Rendered map; `.svg` selects the SVG backend, anything else PNG.
    pub map: PathBuf,
    /// Optional CSV export of the per-region table with its ratio column.
    pub table: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub legend: bool,
    /// Open the rendered map with the system viewer.
    pub open: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map: PathBuf::from("output/referendum_map.png"),
            table: None,
            width: 900,
            height: 900,
            title: Some("Choice A share of expressed votes".to_string()),
            legend: true,
            open: false,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
