use std::fmt;

use serde::Serialize;

use crate::data::Dataset;
use crate::error::LookupError;

/// The single-valued fields shown on the statistics card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountryStats {
    /// km²
    pub area: f64,
    /// People per km²
    pub density: f64,
    /// Percent
    pub growth_rate: f64,
    /// Percent of world population
    pub world_share: f64,
}

pub fn extract_stats(dataset: &Dataset, country: &str) -> Result<CountryStats, LookupError> {
    let record = dataset
        .record(country)
        .ok_or_else(|| LookupError::CountryNotFound(country.to_string()))?;

    Ok(CountryStats {
        area: record.area,
        density: record.density,
        growth_rate: record.growth_rate,
        world_share: record.world_share,
    })
}

impl fmt::Display for CountryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Area (km²): {} km²", self.area)?;
        writeln!(f, "Density (per km²): {} people/km²", self.density)?;
        writeln!(f, "Growth Rate: {} %", self.growth_rate)?;
        write!(f, "World Population Percentage: {} %", self.world_share)
    }
}
