//! Approximate map locations.
//!
//! Residents without stored coordinates are placed at a random point
//! inside their RW's polygon so the map shows neighborhood density
//! without exposing exact addresses. Polygons come from a GeoJSON
//! FeatureCollection keyed `RW1`..`RWn`, with a whole-kelurahan
//! fallback feature for residents whose RW has no polygon.

use std::collections::HashMap;
use std::fs;

use rand::Rng;
use serde_json::Value;

/// Fallback feature name covering the whole kelurahan.
const FALLBACK_KEY: &str = "CIPAMOKOLAN";

/// Attempts at rejection-sampling a point before giving up.
const MAX_ATTEMPTS: usize = 1000;

/// A polygon as one or more exterior rings of `(lon, lat)` vertices.
#[derive(Debug, Clone)]
pub struct Polygon {
    rings: Vec<Vec<(f64, f64)>>,
}

impl Polygon {
    /// Even-odd ray cast against every ring.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, lon, lat))
    }

    /// Bounding box as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut bounds = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (lon, lat) in self.rings.iter().flatten() {
            bounds.0 = bounds.0.min(*lon);
            bounds.1 = bounds.1.min(*lat);
            bounds.2 = bounds.2.max(*lon);
            bounds.3 = bounds.3.max(*lat);
        }
        bounds
    }

    /// A uniform random point inside the polygon, rejection-sampled
    /// from the bounding box. `None` if sampling keeps missing (a
    /// degenerate polygon).
    pub fn random_point(&self, rng: &mut impl Rng) -> Option<(f64, f64)> {
        let (min_lon, min_lat, max_lon, max_lat) = self.bounds();
        if min_lon >= max_lon || min_lat >= max_lat {
            return None;
        }
        for _ in 0..MAX_ATTEMPTS {
            let lon = rng.gen_range(min_lon..max_lon);
            let lat = rng.gen_range(min_lat..max_lat);
            if self.contains(lon, lat) {
                // (lat, lon) order matches the stored koordinat format
                return Some((lat, lon));
            }
        }
        None
    }
}

fn ring_contains(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > lat) != (yj > lat))
            && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// The RW polygon set loaded from the configured GeoJSON file.
#[derive(Debug, Clone, Default)]
pub struct RwPolygons {
    polygons: HashMap<String, Polygon>,
}

impl RwPolygons {
    /// Load a GeoJSON FeatureCollection. Features are keyed by their
    /// `rw` property when present, otherwise by `name`.
    pub fn load(path: &str) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read GeoJSON '{path}': {e}"))?;
        let doc: Value =
            serde_json::from_str(&raw).map_err(|e| format!("Invalid GeoJSON: {e}"))?;

        let mut polygons = HashMap::new();
        let features = doc["features"].as_array().cloned().unwrap_or_default();
        for feature in &features {
            let props = &feature["properties"];
            let key = props["rw"]
                .as_str()
                .or_else(|| props["name"].as_str())
                .or_else(|| feature["name"].as_str());
            let Some(key) = key else { continue };
            if let Some(polygon) = parse_geometry(&feature["geometry"]) {
                polygons.insert(key.to_uppercase(), polygon);
            }
        }
        Ok(Self { polygons })
    }

    /// A random point for a resident of the given RW, falling back to
    /// the whole-kelurahan polygon when the RW has none. Returns
    /// `(lat, lon)`.
    pub fn random_point_for_rw(&self, rw: &str, rng: &mut impl Rng) -> Option<(f64, f64)> {
        let key = format!("RW{}", rw.to_uppercase());
        self.polygons
            .get(&key)
            .or_else(|| self.polygons.get(FALLBACK_KEY))
            .and_then(|p| p.random_point(rng))
    }
}

fn parse_geometry(geometry: &Value) -> Option<Polygon> {
    let coords = &geometry["coordinates"];
    let rings = match geometry["type"].as_str()? {
        // Exterior ring only; interior holes are rare in RW outlines
        "Polygon" => vec![parse_ring(coords.get(0)?)?],
        "MultiPolygon" => coords
            .as_array()?
            .iter()
            .filter_map(|poly| parse_ring(poly.get(0)?))
            .collect(),
        _ => return None,
    };
    if rings.is_empty() {
        return None;
    }
    Some(Polygon { rings })
}

fn parse_ring(ring: &Value) -> Option<Vec<(f64, f64)>> {
    let points = ring
        .as_array()?
        .iter()
        .filter_map(|pt| Some((pt.get(0)?.as_f64()?, pt.get(1)?.as_f64()?)))
        .collect::<Vec<_>>();
    (points.len() >= 3).then_some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon {
            rings: vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]],
        }
    }

    #[test]
    fn test_square_contains() {
        let square = unit_square();
        assert!(square.contains(0.5, 0.5));
        assert!(!square.contains(1.5, 0.5));
        assert!(!square.contains(-0.1, 0.5));
    }

    #[test]
    fn test_random_point_lands_inside() {
        let square = unit_square();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let (lat, lon) = square.random_point(&mut rng).unwrap();
            assert!(square.contains(lon, lat));
        }
    }

    #[test]
    fn test_degenerate_polygon_yields_none() {
        let line = Polygon {
            rings: vec![vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]],
        };
        let mut rng = rand::thread_rng();
        assert_eq!(line.random_point(&mut rng), None);
    }

    #[test]
    fn test_geometry_parsing() {
        let geojson: Value = serde_json::from_str(
            r#"{
                "type": "Polygon",
                "coordinates": [[[107.66, -6.96], [107.67, -6.96], [107.67, -6.95], [107.66, -6.95]]]
            }"#,
        )
        .unwrap();
        let polygon = parse_geometry(&geojson).unwrap();
        assert!(polygon.contains(107.665, -6.955));
        assert!(!polygon.contains(107.7, -6.955));
    }
}
