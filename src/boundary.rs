use geo::{Coord, LineString};
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Point, PointM, PointZ, PolygonRing, Shape};
use std::path::Path;

use crate::error::{Error, Result};
use crate::municipality::{Boundary, Municipality};
use crate::reprojection::{ProjectedPoint, Reprojection};

/// Attribute names of the boundary dataset. Defaults match swissBOUNDARIES3D.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryFields {
    pub name: String,
    pub area: String,
    pub lake_area: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        BoundaryFields {
            name: "NAME".to_string(),
            area: "GEM_FLAECH".to_string(),
            lake_area: "SEE_FLAECH".to_string(),
        }
    }
}

/// Attribute values of a single record, rendered as recorded.
/// Missing or null fields become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryAttributes {
    pub name: String,
    pub area: String,
    pub lake_area: String,
}

impl BoundaryAttributes {
    pub fn from_record(record: &Record, fields: &BoundaryFields) -> Self {
        let text = |field: &str| record.get(field).map(field_text).unwrap_or_default();
        BoundaryAttributes {
            name: text(&fields.name),
            area: text(&fields.area),
            lake_area: text(&fields.lake_area),
        }
    }

    /// A record whose whole area is lake is a water body, not a municipality.
    pub fn is_lake(&self) -> bool {
        self.area == self.lake_area
    }
}

fn field_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Character(Some(s)) => s.trim().to_string(),
        FieldValue::Numeric(Some(n)) => n.to_string(),
        FieldValue::Float(Some(f)) => f.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Double(d) => d.to_string(),
        FieldValue::Character(None) | FieldValue::Numeric(None) | FieldValue::Float(None) => {
            String::new()
        }
        other => format!("{:?}", other),
    }
}

trait PlanarPoint {
    fn projected(&self) -> ProjectedPoint;
}

impl PlanarPoint for Point {
    fn projected(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.x, self.y)
    }
}

impl PlanarPoint for PointM {
    fn projected(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.x, self.y)
    }
}

impl PlanarPoint for PointZ {
    fn projected(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.x, self.y)
    }
}

fn reproject_ring<P: PlanarPoint>(
    points: &[P],
    reprojection: &Reprojection,
) -> Result<LineString<f64>> {
    let coords = points
        .iter()
        .map(|p| reprojection.transform(p.projected()))
        .collect::<Result<Vec<Coord<f64>>>>()?;
    Ok(LineString::from(coords))
}

/// Reprojects the exterior rings only. Holes are not part of this dataset's model.
///
/// A shape whose rings are all wound as holes has lost its orientation on
/// export; those rings are taken as exteriors.
fn reproject_exteriors<P: PlanarPoint>(
    rings: &[PolygonRing<P>],
    reprojection: &Reprojection,
) -> Result<Vec<LineString<f64>>> {
    let has_outer = rings
        .iter()
        .any(|ring| matches!(ring, PolygonRing::Outer(_)));
    rings
        .iter()
        .filter_map(|ring| match ring {
            PolygonRing::Outer(points) => Some(points),
            PolygonRing::Inner(points) if !has_outer => Some(points),
            PolygonRing::Inner(_) => None,
        })
        .map(|points| reproject_ring(points, reprojection))
        .collect()
}

/// Converts a projected shape to a geographic boundary.
pub fn boundary_from_shape(
    name: &str,
    shape: &Shape,
    reprojection: &Reprojection,
) -> Result<Boundary> {
    let exteriors = match shape {
        Shape::Polygon(polygon) => reproject_exteriors(polygon.rings(), reprojection)?,
        Shape::PolygonM(polygon) => reproject_exteriors(polygon.rings(), reprojection)?,
        Shape::PolygonZ(polygon) => reproject_exteriors(polygon.rings(), reprojection)?,
        other => {
            return Err(Error::UnsupportedGeometry {
                name: name.to_string(),
                kind: format!("{:?}", other.shapetype()),
            });
        }
    };
    Ok(Boundary::from_exteriors(exteriors))
}

/// Reads all land municipalities from a shapefile and reprojects them.
///
/// Water bodies are skipped. Any unsupported shape or decoding error
/// aborts the whole load.
pub fn load_municipalities(
    path: &Path,
    fields: &BoundaryFields,
    reprojection: &Reprojection,
) -> Result<Vec<Municipality>> {
    info!("Reading municipal boundaries from {}...", path.display());

    let shapefile_error = |source| Error::Shapefile {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(path).map_err(shapefile_error)?;

    let mut records = Vec::new();
    let mut lakes = 0usize;
    for entry in reader.iter_shapes_and_records() {
        let (shape, record) = entry.map_err(shapefile_error)?;
        let attributes = BoundaryAttributes::from_record(&record, fields);
        if attributes.is_lake() {
            info!("🌊 {} is a lake, skipping", attributes.name);
            lakes += 1;
            continue;
        }
        records.push((shape, attributes));
    }

    debug!("Reprojecting {} boundaries...", records.len());

    let municipalities: Vec<Municipality> = records
        .into_par_iter()
        .map(|(shape, attributes)| {
            let boundary = boundary_from_shape(&attributes.name, &shape, reprojection)?;
            Ok(Municipality::new(attributes.name, boundary))
        })
        .collect::<Result<_>>()?;

    info!(
        "✓ Loaded {} municipalities ({} lakes skipped)",
        municipalities.len(),
        lakes
    );
    Ok(municipalities)
}
