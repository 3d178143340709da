use std::collections::BTreeMap;

use geo::algorithm::bounding_rect::BoundingRect;
use geo::{LineString, MultiPolygon};
use serde_json::json;

use super::model::VegetationFeature;

/// Number of features per `elemento` category.
pub fn category_counts(features: &[VegetationFeature]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for feature in features {
        *counts.entry(feature.category.as_str()).or_insert(0) += 1;
    }
    counts
}

/// `[min_lon, min_lat, max_lon, max_lat]` over all features.
pub fn bounding_box(features: &[VegetationFeature]) -> Option<[f64; 4]> {
    features
        .iter()
        .filter_map(|f| f.geometry.bounding_rect())
        .map(|rect| [rect.min().x, rect.min().y, rect.max().x, rect.max().y])
        .reduce(|[x0, y0, x1, y1], [a0, b0, a1, b1]| {
            [x0.min(a0), y0.min(b0), x1.max(a1), y1.max(b1)]
        })
}

/// GeoJSON `coordinates` of a MultiPolygon: polygons, rings, `[lon, lat]`.
fn coordinates(geometry: &MultiPolygon<f64>) -> Vec<Vec<Vec<[f64; 2]>>> {
    let ring = |line: &LineString<f64>| -> Vec<[f64; 2]> {
        line.0.iter().map(|c| [c.x, c.y]).collect()
    };
    geometry
        .0
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(ring)
                .collect()
        })
        .collect()
}

/// Re-serialise the features as a GeoJSON FeatureCollection carrying only
/// the `elemento` and `fechacreac` properties, for the map layer.
pub fn to_geojson(features: &[VegetationFeature]) -> serde_json::Result<String> {
    let features: Vec<_> = features
        .iter()
        .map(|f| {
            json!({
                "type": "Feature",
                "properties": { "elemento": f.category, "fechacreac": f.created_on },
                "geometry": { "type": "MultiPolygon", "coordinates": coordinates(&f.geometry) },
            })
        })
        .collect();
    serde_json::to_string(&json!({ "type": "FeatureCollection", "features": features }))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::loader::parse_vegetation_geojson;
    use geo::Polygon;

    fn square(category: &str, lon: f64, lat: f64) -> VegetationFeature {
        VegetationFeature {
            category: category.into(),
            created_on: "2001-01-01".into(),
            geometry: MultiPolygon(vec![Polygon::new(
                LineString::from(vec![
                    [lon, lat],
                    [lon + 0.01, lat],
                    [lon + 0.01, lat + 0.01],
                    [lon, lat],
                ]),
                vec![],
            )]),
        }
    }

    #[test]
    fn test_counts_and_bbox() {
        let features = vec![
            square("Parque", -0.38, 39.46),
            square("Jardín", -0.36, 39.47),
            square("Parque", -0.40, 39.45),
        ];
        let counts = category_counts(&features);
        assert_eq!(counts.get("Parque"), Some(&2));
        assert_eq!(counts.get("Jardín"), Some(&1));

        let [x0, y0, x1, y1] = bounding_box(&features).unwrap();
        assert_eq!((x0, y0), (-0.40, 39.45));
        assert!((x1 - -0.35).abs() < 1e-12);
        assert!((y1 - 39.48).abs() < 1e-12);

        assert_eq!(bounding_box(&[]), None);
    }

    #[test]
    fn test_bbox_covers_every_member_polygon() {
        let mut feature = square("Parque", -0.38, 39.46);
        let far = square("Parque", -0.30, 39.50).geometry.0.remove(0);
        feature.geometry.0.push(far);

        let [x0, y0, x1, y1] = bounding_box(&[feature]).unwrap();
        assert_eq!((x0, y0), (-0.38, 39.46));
        assert!((x1 - -0.29).abs() < 1e-12);
        assert!((y1 - 39.51).abs() < 1e-12);
    }

    #[test]
    fn test_holes_survive_geojson() {
        let hole = LineString::from(vec![
            [-0.379, 39.461],
            [-0.378, 39.461],
            [-0.378, 39.462],
            [-0.379, 39.461],
        ]);
        let mut feature = square("Jardín", -0.38, 39.46);
        let exterior = feature.geometry.0[0].exterior().clone();
        feature.geometry = MultiPolygon(vec![Polygon::new(exterior, vec![hole])]);

        let text = to_geojson(&[feature.clone()]).unwrap();
        let back = parse_vegetation_geojson(text.as_bytes(), Path::new("out.geojson")).unwrap();
        assert_eq!(back[0].geometry.0[0].interiors().len(), 1);
        assert_eq!(back, vec![feature]);
    }

    #[test]
    fn test_geojson_reloads() {
        let features = vec![square("Parque", -0.38, 39.46)];
        let text = to_geojson(&features).unwrap();
        let back = parse_vegetation_geojson(text.as_bytes(), Path::new("out.geojson")).unwrap();
        assert_eq!(back, features);
    }
}
