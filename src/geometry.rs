//! Parcel Geometry
//!
//! Validated parcel polygons (WGS84, `[lon, lat]` vertices) and the area
//! helpers used by the overlap detector and the processing-limit check.
//!
//! - Planar area / intersection: `geo` boolean ops on raw degrees. Only used
//!   as ratios, so the projection cancels out for small parcels.
//! - Approximate ground area: equirectangular projection at the ring's mean
//!   latitude.

use geo::{Area, BooleanOps, Centroid, Coord, Intersects, Line, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::data::Location;
use crate::error::GeometryError;

/// Mean Earth radius (m)
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Largest parcel accepted for processing
pub const MAX_PROCESSING_AREA_SQ_KM: f64 = 500.0;

/// Smallest parcel accepted for processing
pub const MIN_PROCESSING_AREA_SQ_M: f64 = 100.0;

/// Closed simple ring of `[lon, lat]` vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct ParcelPolygon {
    polygon: Polygon<f64>,
}

impl ParcelPolygon {
    /// Validate and close a ring
    pub fn new(vertices: &[[f64; 2]]) -> Result<Self, GeometryError> {
        for (index, &[lon, lat]) in vertices.iter().enumerate() {
            let valid = lon.is_finite()
                && lat.is_finite()
                && (-180.0..=180.0).contains(&lon)
                && (-90.0..=90.0).contains(&lat);
            if !valid {
                return Err(GeometryError::InvalidCoordinate { index, lon, lat });
            }
        }

        let mut ring: Vec<[f64; 2]> = vertices.to_vec();
        ring.dedup();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let mut distinct: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
        for v in &ring {
            if !distinct.contains(v) {
                distinct.push(*v);
            }
        }
        if distinct.len() < 3 {
            return Err(GeometryError::TooFewVertices(distinct.len()));
        }
        check_simple_ring(&ring)?;

        // Polygon::new closes the ring
        let exterior: LineString<f64> = ring.iter().map(|&[x, y]| Coord { x, y }).collect();
        Ok(Self { polygon: Polygon::new(exterior, vec![]) })
    }

    /// Ring vertices as `[lon, lat]`, closing vertex included
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
    }

    /// Ring vertices as `[lat, lon]` for map previews
    pub fn preview_lat_lon(&self) -> Vec<[f64; 2]> {
        self.polygon.exterior().coords().map(|c| [c.y, c.x]).collect()
    }

    /// Centroid (falls back to the first vertex for a degenerate ring)
    pub fn centroid(&self) -> Location {
        match self.polygon.centroid() {
            Some(p) => Location::new(p.y(), p.x()),
            None => {
                let first = self.polygon.exterior().0.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
                Location::new(first.y, first.x)
            }
        }
    }

    /// Area in squared degrees
    pub fn planar_area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Intersection area with another parcel (squared degrees)
    pub fn intersection_area(&self, other: &ParcelPolygon) -> f64 {
        self.polygon.intersection(&other.polygon).unsigned_area()
    }

    /// Approximate ground area (m²)
    pub fn approx_area_sq_m(&self) -> f64 {
        let coords = &self.polygon.exterior().0;
        if coords.len() < 4 {
            return 0.0;
        }

        // Closing vertex excluded from the mean
        let open = &coords[..coords.len() - 1];
        let mean_lat = open.iter().map(|c| c.y).sum::<f64>() / open.len() as f64;
        let x_scale = EARTH_RADIUS_M * mean_lat.to_radians().cos();

        let twice_area: f64 = coords
            .windows(2)
            .map(|w| {
                let (x0, y0) = (w[0].x.to_radians() * x_scale, w[0].y.to_radians() * EARTH_RADIUS_M);
                let (x1, y1) = (w[1].x.to_radians() * x_scale, w[1].y.to_radians() * EARTH_RADIUS_M);
                x0 * y1 - x1 * y0
            })
            .sum();

        twice_area.abs() / 2.0
    }

    /// Reject parcels too large or too small to process; returns the area (m²)
    pub fn check_processing_limits(&self) -> Result<f64, GeometryError> {
        let area_sq_m = self.approx_area_sq_m();
        if area_sq_m <= 0.0 || !area_sq_m.is_finite() {
            return Err(GeometryError::NonPositiveArea);
        }
        let area_sq_km = area_sq_m / 1e6;
        if area_sq_km > MAX_PROCESSING_AREA_SQ_KM {
            return Err(GeometryError::TooLarge { area_sq_km, limit_sq_km: MAX_PROCESSING_AREA_SQ_KM });
        }
        if area_sq_m < MIN_PROCESSING_AREA_SQ_M {
            return Err(GeometryError::TooSmall { area_sq_m });
        }
        Ok(area_sq_m)
    }
}

/// Reject rings where two non-adjacent edges touch or cross.
///
/// `ring` is open (no closing vertex) with no consecutive duplicates.
fn check_simple_ring(ring: &[[f64; 2]]) -> Result<(), GeometryError> {
    let n = ring.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| {
            let [x0, y0] = ring[i];
            let [x1, y1] = ring[(i + 1) % n];
            Line::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
        })
        .collect();

    for i in 0..n {
        for j in (i + 2)..n {
            // First and last edge share the closing vertex
            if i == 0 && j == n - 1 {
                continue;
            }
            if edges[i].intersects(&edges[j]) {
                return Err(GeometryError::SelfIntersecting { first_edge: i, second_edge: j });
            }
        }
    }
    Ok(())
}

impl TryFrom<Vec<[f64; 2]>> for ParcelPolygon {
    type Error = GeometryError;

    fn try_from(vertices: Vec<[f64; 2]>) -> Result<Self, Self::Error> {
        ParcelPolygon::new(&vertices)
    }
}

impl From<ParcelPolygon> for Vec<[f64; 2]> {
    fn from(polygon: ParcelPolygon) -> Self {
        polygon.coordinates()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Axis-aligned square with its south-west corner at (lon, lat)
    pub(crate) fn square(lon: f64, lat: f64, side_deg: f64) -> ParcelPolygon {
        ParcelPolygon::new(&[
            [lon, lat],
            [lon + side_deg, lat],
            [lon + side_deg, lat + side_deg],
            [lon, lat + side_deg],
        ])
        .unwrap()
    }

    #[test]
    fn test_ring_is_closed() {
        let p = square(76.0, 10.0, 0.01);
        let coords = p.coordinates();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn test_rejects_too_few_vertices() {
        let err = ParcelPolygon::new(&[[76.0, 10.0], [76.1, 10.0], [76.0, 10.0]]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(2));
        assert!(ParcelPolygon::new(&[]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_coordinate() {
        let err = ParcelPolygon::new(&[[76.0, 10.0], [200.0, 10.0], [76.0, 11.0]]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidCoordinate { index: 1, .. }));
        assert!(ParcelPolygon::new(&[[f64::NAN, 10.0], [76.1, 10.0], [76.0, 11.0]]).is_err());
    }

    #[test]
    fn test_rejects_bow_tie() {
        let bow_tie = [[76.0, 10.0], [76.01, 10.006], [76.01, 10.0], [76.0, 10.01]];
        let err = ParcelPolygon::new(&bow_tie).unwrap_err();
        assert_eq!(err, GeometryError::SelfIntersecting { first_edge: 0, second_edge: 2 });
        assert!(serde_json::from_str::<ParcelPolygon>(
            "[[76.0,10.0],[76.01,10.006],[76.01,10.0],[76.0,10.01]]"
        )
        .is_err());
    }

    #[test]
    fn test_rejects_ring_touching_itself() {
        // Figure-eight pinched at (76.01, 10.01)
        let pinched = [
            [76.0, 10.0],
            [76.01, 10.0],
            [76.01, 10.01],
            [76.02, 10.01],
            [76.02, 10.02],
            [76.01, 10.02],
            [76.01, 10.01],
            [76.0, 10.01],
        ];
        assert!(matches!(ParcelPolygon::new(&pinched), Err(GeometryError::SelfIntersecting { .. })));
    }

    #[test]
    fn test_accepts_concave_ring_and_repeated_vertex() {
        let l_shape = [
            [76.0, 10.0],
            [76.02, 10.0],
            [76.02, 10.01],
            [76.01, 10.01],
            [76.01, 10.02],
            [76.0, 10.02],
        ];
        assert!(ParcelPolygon::new(&l_shape).is_ok());
        let doubled = [[76.0, 10.0], [76.01, 10.0], [76.01, 10.0], [76.01, 10.01], [76.0, 10.01], [76.0, 10.0]];
        assert_eq!(ParcelPolygon::new(&doubled).unwrap().coordinates().len(), 5);
    }

    #[test]
    fn test_approx_area_near_equator() {
        // 0.001° ≈ 111.2 m at the equator
        let p = square(0.0, 0.0, 0.001);
        let side = 0.001f64.to_radians() * EARTH_RADIUS_M;
        assert_relative_eq!(p.approx_area_sq_m(), side * side, max_relative = 1e-4);
        assert!(p.check_processing_limits().is_ok());
    }

    #[test]
    fn test_processing_limits() {
        assert!(matches!(
            square(76.0, 10.0, 0.5).check_processing_limits(),
            Err(GeometryError::TooLarge { .. })
        ));
        assert!(matches!(
            square(76.0, 10.0, 0.00005).check_processing_limits(),
            Err(GeometryError::TooSmall { .. })
        ));
        let line = ParcelPolygon::new(&[[76.0, 10.0], [76.1, 10.0], [76.2, 10.0]]).unwrap();
        assert_eq!(line.check_processing_limits(), Err(GeometryError::NonPositiveArea));
    }

    #[test]
    fn test_intersection_area() {
        let a = square(76.0, 10.0, 0.01);
        let b = square(76.005, 10.0, 0.01);
        assert_relative_eq!(a.intersection_area(&b) / a.planar_area(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_serde_round_trip_keeps_ring() {
        let p = square(76.0, 10.0, 0.01);
        let json = serde_json::to_string(&p).unwrap();
        let back: ParcelPolygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<ParcelPolygon>("[[0,0],[1,1]]").is_err());
    }

    #[test]
    fn test_preview_is_lat_lon() {
        let p = square(76.0, 10.0, 0.01);
        assert_eq!(p.preview_lat_lon()[0], [10.0, 76.0]);
        let c = p.centroid();
        assert_relative_eq!(c.lat, 10.005, epsilon = 1e-9);
        assert_relative_eq!(c.lon, 76.005, epsilon = 1e-9);
    }
}
