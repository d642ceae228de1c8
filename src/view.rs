use serde::Serialize;

use crate::config::MapConfig;
use crate::data::Dataset;
use crate::error::LookupError;
use crate::geometry::{find_geometry, BoundingBox};
use crate::selection::{filter_population, PopulationPoint, Selection};
use crate::stats::{extract_stats, CountryStats};
use crate::types::CountryProfile;

pub const NO_GEOMETRY_NOTICE: &str = "No geospatial data available for the selected country.";

/// Everything the page shows for one country and year selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub country: String,
    pub profile: CountryProfile,
    pub population: PopulationChart,
    pub stats: CountryStats,
    pub map: MapPanel,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationChart {
    pub title: String,
    pub points: Vec<PopulationPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapPanel {
    Available {
        tooltip: String,
        geometry: geojson::Geometry,
        bounds: BoundingBox,
        fit_bounds: [[f64; 2]; 2],
        style: MapStyle,
    },
    Unavailable {
        notice: String,
    },
}

/// Keys follow Leaflet's path options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStyle {
    pub fill_color: String,
    pub fill_opacity: f64,
}

impl From<&MapConfig> for MapStyle {
    fn from(config: &MapConfig) -> Self {
        MapStyle {
            fill_color: config.fill_color.clone(),
            fill_opacity: config.fill_opacity,
        }
    }
}

/// Builds the view for `selection`. A missing boundary only empties the map
/// panel; a missing or unknown country is an error.
pub fn build_view(dataset: &Dataset, selection: &Selection, style: &MapStyle) -> Result<DashboardView, LookupError> {
    let country = selection.country.as_deref().ok_or(LookupError::NoCountrySelected)?;
    let record = dataset
        .record(country)
        .ok_or_else(|| LookupError::CountryNotFound(country.to_string()))?;

    let stats = extract_stats(dataset, country)?;

    let map = match find_geometry(dataset, country) {
        Ok(found) => MapPanel::Available {
            tooltip: found.name.to_string(),
            geometry: geojson::Geometry::new(geojson::Value::from(found.geometry)),
            bounds: found.bounds,
            fit_bounds: found.bounds.fit_bounds(),
            style: style.clone(),
        },
        Err(LookupError::GeometryNotFound(_)) => MapPanel::Unavailable {
            notice: NO_GEOMETRY_NOTICE.to_string(),
        },
        Err(other) => return Err(other),
    };

    Ok(DashboardView {
        country: record.name.clone(),
        profile: record.profile.clone(),
        population: PopulationChart {
            title: format!("Population of {} Over Selected Years", record.name),
            points: filter_population(record, &selection.years),
        },
        stats,
        map,
    })
}
