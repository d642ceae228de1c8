use thiserror::Error;

/// Failure to produce the in-memory dataset. Either source failing means
/// neither is used.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Invalid value {value:?} in column {column:?} on row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid boundary for {country}: {reason}")]
    InvalidGeometry { country: String, reason: String },

    #[error("Duplicate country in population table: {0}")]
    DuplicateCountry(String),

    #[error("Unsupported boundary format: {0}")]
    UnsupportedFormat(String),

    #[error("GeoJSON must be a FeatureCollection")]
    NotFeatureCollection,

    #[error("Shapefiles can only be read from a local path: {0}")]
    RemoteShapefile(String),
}

impl LoadError {
    /// Text shown to the user in place of the dashboard.
    pub fn notice(&self) -> String {
        format!("An error occurred: {self}")
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Please select a country to view its data.")]
    NoCountrySelected,

    #[error("Country not found: {0}")]
    CountryNotFound(String),

    #[error("No geospatial data available for {0}")]
    GeometryNotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unknown year label: {0:?}")]
    UnknownYear(String),
}
