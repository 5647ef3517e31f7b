use chrono::NaiveDate;
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Coord, Geometry, LineString, MultiPolygon, Polygon, Rect};

/// Outline of a municipality in WGS84 lon/lat.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Boundary {
    /// One exterior ring gives a polygon, several give a multipolygon.
    pub fn from_exteriors(mut exteriors: Vec<LineString<f64>>) -> Self {
        if exteriors.len() == 1 {
            if let Some(exterior) = exteriors.pop() {
                return Boundary::Polygon(Polygon::new(exterior, vec![]));
            }
        }
        Boundary::MultiPolygon(MultiPolygon::new(
            exteriors
                .into_iter()
                .map(|exterior| Polygon::new(exterior, vec![]))
                .collect(),
        ))
    }

    /// Boundary-inclusive containment: a point on an edge or vertex counts.
    pub fn contains(&self, coord: &Coord<f64>) -> bool {
        let position = match self {
            Boundary::Polygon(polygon) => polygon.coordinate_position(coord),
            Boundary::MultiPolygon(multi) => multi.coordinate_position(coord),
        };
        position != CoordPos::Outside
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Boundary::Polygon(polygon) => polygon.bounding_rect(),
            Boundary::MultiPolygon(multi) => multi.bounding_rect(),
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Boundary::Polygon(polygon) => Geometry::Polygon(polygon.clone()),
            Boundary::MultiPolygon(multi) => Geometry::MultiPolygon(multi.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub name: String,
    pub boundary: Boundary,
    /// Date of the earliest done track passing through, if any.
    pub first_visit: Option<NaiveDate>,
    /// Set when no done track but at least one planned track passes through.
    pub planned: bool,
}

impl Municipality {
    pub fn new(name: impl Into<String>, boundary: Boundary) -> Self {
        Municipality {
            name: name.into(),
            boundary,
            first_visit: None,
            planned: false,
        }
    }

    pub fn is_visited(&self) -> bool {
        self.first_visit.is_some()
    }
}
