use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

pub const DEFAULT_SHAPEFILE_URL: &str =
    "https://www2.census.gov/geo/tiger/GENZ2021/shp/cb_2021_us_county_20m.zip";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
    pub download: DownloadConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub listings: PathBuf,
    pub shapefile: Option<PathBuf>,
    pub shapefile_url: String,
    pub cache_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            listings: PathBuf::from("combined_data.json"),
            shapefile: None,
            shapefile_url: DEFAULT_SHAPEFILE_URL.to_string(),
            cache_dir: PathBuf::from("us_counties_shapefile"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProcessingConfig {
    pub simplify_tolerance: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { simplify_tolerance: 0.01 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub map_html: PathBuf,
    pub plot_png: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map_html: PathBuf::from("us_counties_map.html"),
            plot_png: PathBuf::from("us_counties_plot.png"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub retries: u32,
    pub backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_ms: 500,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// [min_lon, min_lat, max_lon, max_lat]
    pub extent: [f64; 4],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1000,
            extent: [-125.0, 24.0, -66.0, 50.0],
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::warn!("Config file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn cached_shapefile_path(&self) -> PathBuf {
        let stem = self.input.shapefile_url
            .rsplit('/')
            .next()
            .and_then(|name| name.strip_suffix(".zip"))
            .unwrap_or("counties");
        self.input.cache_dir.join(format!("{}.shp", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            listings = "data"

            [plot]
            width = 800
            "#,
        )
        .unwrap();

        assert_eq!(config.input.listings, PathBuf::from("data"));
        assert_eq!(config.input.shapefile_url, DEFAULT_SHAPEFILE_URL);
        assert_eq!(config.plot.width, 800);
        assert_eq!(config.plot.height, 1000);
        assert_eq!(config.download.retries, 3);
        assert!((config.processing.simplify_tolerance - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn cached_path_follows_archive_name() {
        let config = AppConfig::default();
        assert_eq!(
            config.cached_shapefile_path(),
            PathBuf::from("us_counties_shapefile/cb_2021_us_county_20m.shp")
        );
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.output.map_html, PathBuf::from("us_counties_map.html"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[input\nlistings = ").unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
