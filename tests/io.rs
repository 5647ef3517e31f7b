//! Tests for GeoJSON output

use chrono::NaiveDate;
use gemeinden::io::feature_collection;
use gemeinden::{Boundary, Municipality, read_feature_collection, write_feature_collection};
use geo::{Geometry, MultiPolygon, polygon};
use tempfile::TempDir;

fn bern() -> Municipality {
    let mut m = Municipality::new(
        "Bern",
        Boundary::Polygon(polygon![
            (x: 7.2944, y: 46.9190),
            (x: 7.4955, y: 46.9190),
            (x: 7.4955, y: 46.9901),
            (x: 7.2944, y: 46.9901),
        ]),
    );
    m.first_visit = NaiveDate::from_ymd_opt(2023, 7, 14);
    m
}

fn biel() -> Municipality {
    let mut m = Municipality::new(
        "Biel/Bienne",
        Boundary::MultiPolygon(MultiPolygon::new(vec![
            polygon![(x: 7.20, y: 47.12), (x: 7.30, y: 47.12), (x: 7.30, y: 47.17)],
            polygon![(x: 7.31, y: 47.12), (x: 7.33, y: 47.12), (x: 7.33, y: 47.13)],
        ])),
    );
    m.planned = true;
    m
}

fn plain() -> Municipality {
    Municipality::new(
        "Ittigen",
        Boundary::Polygon(polygon![(x: 7.47, y: 46.97), (x: 7.50, y: 46.97), (x: 7.50, y: 46.99)]),
    )
}

fn coords_close(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    use geo::CoordsIter;
    a.coords_count() == b.coords_count()
        && a
            .coords_iter()
            .zip(b.coords_iter())
            .all(|(p, q)| (p.x - q.x).abs() < 1e-6 && (p.y - q.y).abs() < 1e-6)
}

#[test]
fn test_properties_only_present_when_set() {
    let collection = feature_collection(&[bern(), biel(), plain()]);
    let props: Vec<_> = collection
        .features
        .iter()
        .map(|f| f.properties.clone().unwrap())
        .collect();

    assert_eq!(props[0]["name"], "Bern");
    assert_eq!(props[0]["firstVisit"], "2023-07-14");
    assert!(!props[0].contains_key("planned"));

    assert_eq!(props[1]["planned"], true);
    assert!(!props[1].contains_key("firstVisit"));

    assert_eq!(props[2].len(), 1);
}

#[test]
fn test_geometry_kinds() {
    let collection = feature_collection(&[bern(), biel()]);
    let values: Vec<&geojson::Value> = collection
        .features
        .iter()
        .map(|f| &f.geometry.as_ref().unwrap().value)
        .collect();
    assert!(matches!(values[0], geojson::Value::Polygon(_)));
    assert!(matches!(values[1], geojson::Value::MultiPolygon(_)));
}

#[test]
fn test_write_then_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("visited.geojson");
    let municipalities = vec![bern(), biel(), plain()];

    write_feature_collection(&municipalities, &path).unwrap();
    let features = read_feature_collection(&path).unwrap();

    assert_eq!(features.len(), 3);
    for (feature, municipality) in features.iter().zip(&municipalities) {
        assert_eq!(feature.name, municipality.name);
        assert_eq!(feature.first_visit, municipality.first_visit);
        assert_eq!(feature.planned, municipality.planned);
        assert!(coords_close(&feature.geometry, &municipality.boundary.to_geometry()));
    }
}

#[test]
fn test_output_is_a_plain_feature_collection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("todo.geojson");

    write_feature_collection(&[plain()], &path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(json["type"], "FeatureCollection");
    assert_eq!(json["features"][0]["type"], "Feature");
    assert_eq!(json["features"][0]["properties"]["name"], "Ittigen");
}

#[test]
fn test_existing_output_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("visited.geojson");

    write_feature_collection(&[bern(), biel()], &path).unwrap();
    write_feature_collection(&[plain()], &path).unwrap();

    let features = read_feature_collection(&path).unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].name, "Ittigen");
}

#[test]
fn test_empty_collection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("visited.geojson");

    write_feature_collection(&[], &path).unwrap();

    assert!(read_feature_collection(&path).unwrap().is_empty());
}
