use crate::config::{AppConfig, InputConfig};
use crate::error::LoadError;
use crate::geometry::GeometryIndex;
use crate::selection::Year;
use crate::types::{CountryGeometry, CountryProfile, CountryRecord};
use csv::{ReaderBuilder, StringRecord};
use geo::MultiPolygon;
use geojson::GeoJson;
use serde::Serialize;
use shapefile::Reader;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const AREA_COLUMN: &str = "Area (km²)";
pub const DENSITY_COLUMN: &str = "Density (per km²)";
pub const GROWTH_RATE_COLUMN: &str = "Growth Rate";
pub const WORLD_SHARE_COLUMN: &str = "World Population Percentage";

const RANK_COLUMN: &str = "Rank";
const CCA3_COLUMN: &str = "CCA3";
const CAPITAL_COLUMN: &str = "Capital";
const CONTINENT_COLUMN: &str = "Continent";

/// Countries whose names appear in only one of the two datasets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NameCoverage {
    pub matched: usize,
    /// In population table order.
    pub records_without_geometry: Vec<String>,
    /// Sorted by name.
    pub geometries_without_record: Vec<String>,
}

impl NameCoverage {
    fn compute(records: &[CountryRecord], geometries: &HashMap<String, usize>) -> Self {
        let record_names: BTreeSet<&str> = records.iter().map(|r| r.name.as_str()).collect();

        let records_without_geometry: Vec<String> = records
            .iter()
            .filter(|r| !geometries.contains_key(&r.name))
            .map(|r| r.name.clone())
            .collect();

        let geometries_without_record: Vec<String> = geometries
            .keys()
            .filter(|name| !record_names.contains(name.as_str()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        NameCoverage {
            matched: records.len() - records_without_geometry.len(),
            records_without_geometry,
            geometries_without_record,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.records_without_geometry.is_empty() && self.geometries_without_record.is_empty()
    }
}

/// Both datasets, loaded once and read-only afterwards.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<CountryRecord>,
    records_by_name: HashMap<String, usize>,
    geometries: Vec<CountryGeometry>,
    geometries_by_name: HashMap<String, usize>,
    index: GeometryIndex,
    coverage: NameCoverage,
}

impl Dataset {
    /// Country names must be unique in the population table. Repeated
    /// boundary names keep the first outline.
    pub fn new(records: Vec<CountryRecord>, geometries: Vec<CountryGeometry>) -> Result<Self, LoadError> {
        let mut records_by_name = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if records_by_name.insert(record.name.clone(), i).is_some() {
                return Err(LoadError::DuplicateCountry(record.name.clone()));
            }
        }

        let mut unique_geometries = Vec::with_capacity(geometries.len());
        let mut geometries_by_name = HashMap::with_capacity(geometries.len());
        for geometry in geometries {
            if geometries_by_name.contains_key(&geometry.name) {
                debug!(country = %geometry.name, "Skipping repeated boundary");
                continue;
            }
            geometries_by_name.insert(geometry.name.clone(), unique_geometries.len());
            unique_geometries.push(geometry);
        }

        let index = GeometryIndex::build(&unique_geometries);
        let coverage = NameCoverage::compute(&records, &geometries_by_name);

        Ok(Dataset {
            records,
            records_by_name,
            geometries: unique_geometries,
            geometries_by_name,
            index,
            coverage,
        })
    }

    /// Selector options, in population table order.
    pub fn country_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    pub fn record(&self, name: &str) -> Option<&CountryRecord> {
        self.records_by_name.get(name).map(|&i| &self.records[i])
    }

    pub fn geometry(&self, name: &str) -> Option<&CountryGeometry> {
        self.geometries_by_name.get(name).map(|&i| &self.geometries[i])
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn coverage(&self) -> &NameCoverage {
        &self.coverage
    }

    /// Name of the country whose outline contains the point.
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<&str> {
        self.index
            .locate(&self.geometries, lon, lat)
            .map(|i| self.geometries[i].name.as_str())
    }
}

/// Fetches and parses both sources. Any failure discards everything.
pub async fn load_dataset(config: &AppConfig) -> Result<Dataset, LoadError> {
    let input = &config.input;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(input.fetch_timeout_secs))
        .build()
        .map_err(LoadError::Client)?;

    // 1. Population table
    let csv_bytes = fetch_source(&client, &input.population_csv).await?;
    let records = parse_population_csv(csv_bytes.as_slice(), &input.name_column_csv)?;
    info!(countries = records.len(), "Loaded population table");

    // 2. Boundaries (Shapefile or GeoJSON)
    let geometries = load_boundaries(&client, input).await?;
    info!(boundaries = geometries.len(), "Loaded country boundaries");

    let dataset = Dataset::new(records, geometries)?;
    report_coverage(dataset.coverage());

    Ok(dataset)
}

fn report_coverage(coverage: &NameCoverage) {
    if coverage.is_complete() {
        info!(matched = coverage.matched, "Every country has a boundary");
        return;
    }
    if !coverage.records_without_geometry.is_empty() {
        warn!(
            count = coverage.records_without_geometry.len(),
            names = ?coverage.records_without_geometry,
            "Countries without a boundary; their map panel will be empty"
        );
    }
    if !coverage.geometries_without_record.is_empty() {
        warn!(
            count = coverage.geometries_without_record.len(),
            names = ?coverage.geometries_without_record,
            "Boundaries without a population row"
        );
    }
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn fetch_source(client: &reqwest::Client, source: &str) -> Result<Vec<u8>, LoadError> {
    if !is_remote(source) {
        debug!(path = source, "Reading local file");
        return tokio::fs::read(source).await.map_err(|e| LoadError::Io {
            path: source.to_string(),
            source: e,
        });
    }

    info!(url = source, "Fetching");
    let http_error = |e| LoadError::Http {
        url: source.to_string(),
        source: e,
    };
    let response = client.get(source).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: source.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await.map_err(http_error)?;
    Ok(body.to_vec())
}

fn boundary_format(source: &str) -> Result<String, LoadError> {
    // Ignore any query string on URLs
    let without_query = source.split(['?', '#']).next().unwrap_or(source);
    Path::new(without_query)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .ok_or_else(|| LoadError::UnsupportedFormat(source.to_string()))
}

async fn load_boundaries(client: &reqwest::Client, input: &InputConfig) -> Result<Vec<CountryGeometry>, LoadError> {
    let source = &input.boundaries;
    match boundary_format(source)?.as_str() {
        "shp" if is_remote(source) => Err(LoadError::RemoteShapefile(source.clone())),
        "shp" => load_shapefile(Path::new(source), &input.name_property_geometry),
        "json" | "geojson" => {
            let bytes = fetch_source(client, source).await?;
            parse_geojson(bytes.as_slice(), &input.name_property_geometry)
        }
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Reads the population table. Every year column and the four statistics
/// columns must be present; descriptive columns are optional.
pub fn parse_population_csv<R: Read>(reader: R, name_column: &str) -> Result<Vec<CountryRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    // Map column names to indices for faster lookup
    let col_indices: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let required = |name: &str| {
        col_indices
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };

    let name_idx = required(name_column)?;
    let year_labels: Vec<String> = Year::labels();
    let year_idx = year_labels
        .iter()
        .map(|label| required(label.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    let area_idx = required(AREA_COLUMN)?;
    let density_idx = required(DENSITY_COLUMN)?;
    let growth_idx = required(GROWTH_RATE_COLUMN)?;
    let share_idx = required(WORLD_SHARE_COLUMN)?;

    let rank_idx = col_indices.get(RANK_COLUMN).copied();
    let cca3_idx = col_indices.get(CCA3_COLUMN).copied();
    let capital_idx = col_indices.get(CAPITAL_COLUMN).copied();
    let continent_idx = col_indices.get(CONTINENT_COLUMN).copied();

    let mut records = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Row numbers as a spreadsheet shows them, header is row 1
        let row = row + 2;

        let name = record.get(name_idx).unwrap_or("").to_string();
        if name.is_empty() {
            debug!(row, "Skipping row without a country name");
            continue;
        }

        let mut populations = [0u64; Year::COUNT];
        for (slot, (&idx, label)) in populations.iter_mut().zip(year_idx.iter().zip(&year_labels)) {
            *slot = parse_count(&record, idx, row, label)?;
        }

        let text = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        records.push(CountryRecord {
            name,
            profile: CountryProfile {
                rank: text(rank_idx).and_then(|s| s.parse().ok()),
                cca3: text(cca3_idx),
                capital: text(capital_idx),
                continent: text(continent_idx),
            },
            populations,
            area: parse_number(&record, area_idx, row, AREA_COLUMN)?,
            density: parse_number(&record, density_idx, row, DENSITY_COLUMN)?,
            growth_rate: parse_number(&record, growth_idx, row, GROWTH_RATE_COLUMN)?,
            world_share: parse_number(&record, share_idx, row, WORLD_SHARE_COLUMN)?,
        });
    }

    Ok(records)
}

fn parse_number(record: &StringRecord, idx: usize, row: usize, column: &str) -> Result<f64, LoadError> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::InvalidValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        })
}

// Population counts are integers, but exports sometimes write them as "1.0e6" or "123.0".
fn parse_count(record: &StringRecord, idx: usize, row: usize, column: &str) -> Result<u64, LoadError> {
    let raw = record.get(idx).unwrap_or("");
    if let Ok(count) = raw.parse::<u64>() {
        return Ok(count);
    }
    match parse_number(record, idx, row, column)? {
        v if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(LoadError::InvalidValue {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Reads polygon and multipolygon features keyed by `name_property`. Other
/// geometry types and unnamed features are skipped.
pub fn parse_geojson<R: Read>(reader: R, name_property: &str) -> Result<Vec<CountryGeometry>, LoadError> {
    let geojson = GeoJson::from_reader(reader).map_err(geojson::Error::from)?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(LoadError::NotFeatureCollection),
    };

    let mut geometries = Vec::new();

    for feature in collection.features {
        let name_val = feature.properties.as_ref().and_then(|props| props.get(name_property));

        let name = match name_val {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                debug!(property = name_property, "Skipping feature without a name");
                continue;
            }
        };

        let geometry = match feature.geometry {
            Some(geo) => {
                let valid_geo: geo::Geometry<f64> = geo.value.try_into()?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        debug!(country = %name, "Skipping non-polygon boundary");
                        continue;
                    }
                }
            }
            None => {
                debug!(country = %name, "Skipping feature without a geometry");
                continue;
            }
        };

        geometries.push(CountryGeometry { name, geometry });
    }

    Ok(geometries)
}

pub fn load_shapefile(path: &Path, name_field: &str) -> Result<Vec<CountryGeometry>, LoadError> {
    let mut reader = Reader::from_path(path)?;

    let mut geometries = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name = match record.get(name_field) {
            Some(shapefile::dbase::FieldValue::Character(Some(s))) if !s.trim().is_empty() => {
                s.trim().to_string()
            }
            Some(shapefile::dbase::FieldValue::Character(_)) => continue,
            Some(_) => return Err(LoadError::MissingColumn(format!("{name_field} (character field)"))),
            None => return Err(LoadError::MissingColumn(name_field.to_string())),
        };

        let invalid = |e: &dyn std::fmt::Debug| LoadError::InvalidGeometry {
            country: name.clone(),
            reason: format!("{:?}", e),
        };
        let geometry: MultiPolygon<f64> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into().map_err(|e| invalid(&e))?,
            shapefile::Shape::PolygonM(polygon) => polygon.try_into().map_err(|e| invalid(&e))?,
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into().map_err(|e| invalid(&e))?,
            _ => continue, // Skip non-polygon shapes
        };

        geometries.push(CountryGeometry { name, geometry });
    }

    Ok(geometries)
}
