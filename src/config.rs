use crate::plot::{Canvas, OutputFormat};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

fn empty_path_none<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<PathBuf>::deserialize(deserializer)?;
    Ok(opt.and_then(|path| {
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }))
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config io error: {}", err),
            ConfigError::Parse(err) => write!(f, "config parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings shared by both tools. Command-line flags override these.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub points: PointsConfig,
    pub distribution: DistributionSettings,
    pub output: OutputConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(ConfigError::Parse)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Write all extraction reports as JSON to this file.
    #[serde(deserialize_with = "empty_path_none")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub marker_size: f64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        PointsConfig { marker_size: 2.5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DistributionSettings {
    pub bin_size: f64,
    pub percentile: u8,
    pub clip: bool,
    /// File looked up in each directory given with `-d`.
    pub filename: String,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        DistributionSettings {
            bin_size: 1.0,
            percentile: 100,
            clip: true,
            filename: "cpdv_flow0.tsv".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub width: usize,
    pub height: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let canvas = Canvas::default();
        OutputConfig {
            format: canvas.format,
            width: canvas.width,
            height: canvas.height,
        }
    }
}

impl OutputConfig {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            format: self.format,
            width: self.width,
            height: self.height,
        }
    }
}
