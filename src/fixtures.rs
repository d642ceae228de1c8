//! Shared test data: three countries (Aruba, Nigeria, Chad) and boundaries
//! for Nigeria, Chad and a country missing from the table (Atlantis).

use geo::{polygon, MultiPolygon};

use crate::data::{parse_geojson, parse_population_csv, Dataset};
use crate::types::{CountryGeometry, CountryRecord};

pub const POPULATION_CSV: &str = include_str!("../tests/fixtures/world_population.csv");
pub const BOUNDARIES_GEOJSON: &str = include_str!("../tests/fixtures/world.geojson");

pub fn records() -> Vec<CountryRecord> {
    parse_population_csv(POPULATION_CSV.as_bytes(), "Country/Territory").unwrap()
}

pub fn geometries() -> Vec<CountryGeometry> {
    parse_geojson(BOUNDARIES_GEOJSON.as_bytes(), "name").unwrap()
}

pub fn dataset() -> Dataset {
    Dataset::new(records(), geometries()).unwrap()
}

pub fn square(name: &str, x0: f64, y0: f64, size: f64) -> CountryGeometry {
    CountryGeometry {
        name: name.to_string(),
        geometry: MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]]),
    }
}
