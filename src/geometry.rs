use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{MultiPolygon, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;
use std::fmt;

use crate::data::Dataset;
use crate::error::LookupError;
use crate::types::CountryGeometry;

/// Axis-aligned extent of a country outline, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// `None` for a geometry without coordinates.
    pub fn of(geometry: &MultiPolygon<f64>) -> Option<Self> {
        geometry.bounding_rect().map(BoundingBox::from)
    }

    /// South-west and north-east corners as `[lat, lon]` pairs, the shape
    /// map libraries take for framing a view.
    pub fn fit_bounds(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lon], [self.max_lat, self.max_lon]]
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        // geo keeps x as longitude and y as latitude
        BoundingBox {
            min_lat: rect.min().y,
            min_lon: rect.min().x,
            max_lat: rect.max().y,
            max_lon: rect.max().x,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GeometryView<'a> {
    pub name: &'a str,
    pub geometry: &'a MultiPolygon<f64>,
    pub bounds: BoundingBox,
}

/// Boundary of `country` together with the box that frames it.
pub fn find_geometry<'a>(dataset: &'a Dataset, country: &str) -> Result<GeometryView<'a>, LookupError> {
    let not_found = || LookupError::GeometryNotFound(country.to_string());

    let entry = dataset.geometry(country).ok_or_else(not_found)?;
    let bounds = BoundingBox::of(&entry.geometry).ok_or_else(not_found)?;

    Ok(GeometryView {
        name: &entry.name,
        geometry: &entry.geometry,
        bounds,
    })
}

// Wrapper for RTree indexing
struct CountryEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for CountryEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

/// Spatial index answering "which outline contains this point".
pub struct GeometryIndex {
    tree: RTree<CountryEnvelope>,
}

impl fmt::Debug for GeometryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryIndex").field("size", &self.tree.size()).finish()
    }
}

impl GeometryIndex {
    pub fn build(geometries: &[CountryGeometry]) -> Self {
        let items: Vec<CountryEnvelope> = geometries
            .iter()
            .enumerate()
            .filter_map(|(index, country)| {
                let rect = country.geometry.bounding_rect()?;
                Some(CountryEnvelope {
                    index,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        GeometryIndex {
            tree: RTree::bulk_load(items),
        }
    }

    /// Position in `geometries` of the first outline containing the point.
    pub fn locate(&self, geometries: &[CountryGeometry], lon: f64, lat: f64) -> Option<usize> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|candidate| candidate.index)
            .find(|&index| {
                geometries
                    .get(index)
                    .is_some_and(|country| country.geometry.contains(&point))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, square};
    use geo::MultiPolygon;

    #[test]
    fn every_outline_is_found_with_ordered_bounds() {
        let dataset = fixtures::dataset();

        for country in fixtures::geometries() {
            let found = find_geometry(&dataset, &country.name).unwrap();

            assert_eq!(found.name, country.name);
            assert!(!found.geometry.0.is_empty());
            assert!(found.bounds.min_lat <= found.bounds.max_lat);
            assert!(found.bounds.min_lon <= found.bounds.max_lon);
        }
    }

    #[test]
    fn names_without_outline_are_not_found() {
        let dataset = fixtures::dataset();

        // Aruba has a population row but no boundary; the other two were
        // dropped while parsing (point and null geometries)
        for name in ["Aruba", "Pointland", "Nullland", "Nowhere"] {
            assert_eq!(
                find_geometry(&dataset, name).unwrap_err(),
                LookupError::GeometryNotFound(name.to_string())
            );
        }
    }

    #[test]
    fn bounding_box_maps_x_to_longitude() {
        let country = square("Box", 3.0, 4.0, 10.0);
        let bounds = BoundingBox::of(&country.geometry).unwrap();

        assert_eq!(
            bounds,
            BoundingBox { min_lat: 4.0, min_lon: 3.0, max_lat: 14.0, max_lon: 13.0 }
        );
        assert_eq!(bounds.fit_bounds(), [[4.0, 3.0], [14.0, 13.0]]);
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        assert_eq!(BoundingBox::of(&MultiPolygon::new(vec![])), None);
    }

    #[test]
    fn index_locates_containing_outline() {
        let geometries = vec![square("West", -10.0, 0.0, 5.0), square("East", 10.0, 0.0, 5.0)];
        let index = GeometryIndex::build(&geometries);

        assert_eq!(index.locate(&geometries, 12.0, 2.0), Some(1));
        assert_eq!(index.locate(&geometries, -8.0, 1.0), Some(0));
        assert_eq!(index.locate(&geometries, 0.0, 2.0), None);
    }

    #[test]
    fn index_skips_outlines_without_coordinates() {
        let geometries = vec![
            CountryGeometry { name: "Empty".to_string(), geometry: MultiPolygon::new(vec![]) },
            square("Full", 0.0, 0.0, 1.0),
        ];
        let index = GeometryIndex::build(&geometries);

        assert_eq!(index.locate(&geometries, 0.5, 0.5), Some(1));
    }
}
