use geo::MultiPolygon;
use serde::Serialize;

use crate::selection::Year;

/// One row of the population table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRecord {
    pub name: String,
    pub profile: CountryProfile,
    // Indexed by `Year::index`, one entry per year of the enumeration.
    pub populations: [u64; Year::COUNT],
    pub area: f64,
    pub density: f64,
    pub growth_rate: f64,
    pub world_share: f64,
}

impl CountryRecord {
    pub fn population_at(&self, year: Year) -> u64 {
        self.populations[year.index()]
    }
}

/// Descriptive columns carried by the source table. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryProfile {
    pub rank: Option<u32>,
    pub cca3: Option<String>,
    pub capital: Option<String>,
    pub continent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CountryGeometry {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}
