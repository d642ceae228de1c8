use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_POPULATION_CSV: &str = "https://raw.githubusercontent.com/tommyscodebase/12_Days_Geospatial_Python_Bootcamp/main/13_final_project_data/world_population.csv";
pub const DEFAULT_BOUNDARIES: &str = "https://raw.githubusercontent.com/tommyscodebase/12_Days_Geospatial_Python_Bootcamp/main/13_final_project_data/world.geojson";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// URL or local path of the population table.
    pub population_csv: String,
    /// URL or local path of the boundaries (GeoJSON, or a local .shp).
    pub boundaries: String,
    pub name_column_csv: String,
    pub name_property_geometry: String,
    pub fetch_timeout_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            population_csv: DEFAULT_POPULATION_CSV.to_string(),
            boundaries: DEFAULT_BOUNDARIES.to_string(),
            name_column_csv: "Country/Territory".to_string(),
            name_property_geometry: "name".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            fill_color: "red".to_string(),
            fill_opacity: 0.7,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 8501,
            static_dir: PathBuf::from("web"),
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

    /// Built-in defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }
}
