#![allow(dead_code)]

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, PolygonRing};
use std::path::Path;

/// A boundary record to be written into a test shapefile.
pub struct BoundaryRecord {
    pub name: &'static str,
    pub area: f64,
    pub lake_area: f64,
    /// Outer rings as (easting, northing) rectangles: min corner and size.
    pub squares: Vec<(f64, f64, f64)>,
}

/// Clockwise closed ring, which is how shapefiles mark an outer ring.
pub fn square_ring(east: f64, north: f64, size: f64) -> PolygonRing<Point> {
    PolygonRing::Outer(vec![
        Point::new(east, north),
        Point::new(east, north + size),
        Point::new(east + size, north + size),
        Point::new(east + size, north),
        Point::new(east, north),
    ])
}

pub fn write_boundaries(path: &Path, records: &[BoundaryRecord]) {
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("NAME").unwrap(), 50)
        .add_numeric_field(FieldName::try_from("GEM_FLAECH").unwrap(), 12, 0)
        .add_numeric_field(FieldName::try_from("SEE_FLAECH").unwrap(), 12, 0);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();

    for boundary in records {
        let rings = boundary
            .squares
            .iter()
            .map(|&(east, north, size)| square_ring(east, north, size))
            .collect();
        let polygon = shapefile::Polygon::with_rings(rings);

        let mut record = Record::default();
        record.insert(
            "NAME".to_string(),
            FieldValue::Character(Some(boundary.name.to_string())),
        );
        record.insert("GEM_FLAECH".to_string(), FieldValue::Numeric(Some(boundary.area)));
        record.insert("SEE_FLAECH".to_string(), FieldValue::Numeric(Some(boundary.lake_area)));

        writer.write_shape_and_record(&polygon, &record).unwrap();
    }
}

/// A shapefile of point shapes, which no municipality may use.
pub fn write_points(path: &Path, names: &[&str]) {
    let table = TableWriterBuilder::new()
        .add_character_field(FieldName::try_from("NAME").unwrap(), 50)
        .add_numeric_field(FieldName::try_from("GEM_FLAECH").unwrap(), 12, 0)
        .add_numeric_field(FieldName::try_from("SEE_FLAECH").unwrap(), 12, 0);
    let mut writer = shapefile::Writer::from_path(path, table).unwrap();

    for (i, name) in names.iter().enumerate() {
        let point = Point::new(2_600_000.0 + 1000.0 * i as f64, 1_200_000.0);
        let mut record = Record::default();
        record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
        record.insert("GEM_FLAECH".to_string(), FieldValue::Numeric(Some(100.0)));
        record.insert("SEE_FLAECH".to_string(), FieldValue::Numeric(Some(0.0)));
        writer.write_shape_and_record(&point, &record).unwrap();
    }
}
