//! Swiss LV95 (EPSG:2056) to WGS84 (EPSG:4326) lon/lat.
//!
//! PROJ performs the projection inverse and the CH1903+ datum shift. A
//! configurable [`Correction`] is subtracted from every result.

use geo::Coord;
use proj::Proj;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const EPSG_LV95: i32 = 2056;
pub const EPSG_WGS84: i32 = 4326;

thread_local! {
    // Proj is !Sync, every worker gets its own handle
    static LV95_TO_WGS84: std::result::Result<Proj, String> = Proj::new_known_crs(
        format!("EPSG:{}", EPSG_LV95).as_str(),
        format!("EPSG:{}", EPSG_WGS84).as_str(),
        None,
    )
    .map_err(|e| e.to_string());
}

/// Projected reference point used to calibrate the transform.
pub const REFERENCE_PROJECTED: ProjectedPoint = ProjectedPoint {
    easting: 2_600_000.0,
    northing: 1_200_000.0,
};

/// WGS84 position of [`REFERENCE_PROJECTED`], the old observatory of Bern.
pub const REFERENCE_WGS84: Coord<f64> = Coord {
    x: 7.438_637_2,
    y: 46.951_081_1,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub easting: f64,
    pub northing: f64,
}

impl ProjectedPoint {
    pub fn new(easting: f64, northing: f64) -> Self {
        ProjectedPoint { easting, northing }
    }
}

/// Offset in degrees subtracted from every transformed coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub lon: f64,
    pub lat: f64,
}

impl Correction {
    /// Offsets that align a Hotine oblique Mercator inverse without any
    /// datum shift with the surveyed boundaries. Only needed when the
    /// geographic input was produced that way.
    pub const EMPIRICAL: Correction = Correction {
        lon: 0.000_975_534_710_3,
        lat: 0.001_892_481_137,
    };

    pub const NONE: Correction = Correction { lon: 0.0, lat: 0.0 };
}

/// PROJ output already lands on WGS84, so nothing is subtracted by default.
impl Default for Correction {
    fn default() -> Self {
        Correction::NONE
    }
}

/// LV95 -> WGS84 lon/lat transform. Build once, share by copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reprojection {
    correction: Correction,
}

impl Reprojection {
    pub fn new(correction: Correction) -> Self {
        Reprojection { correction }
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Corrected WGS84 lon/lat of a projected point.
    pub fn transform(&self, point: ProjectedPoint) -> Result<Coord<f64>> {
        let (lon, lat) = LV95_TO_WGS84.with(|proj| -> Result<(f64, f64)> {
            let proj = proj
                .as_ref()
                .map_err(|message| Error::Projection(message.clone()))?;
            proj.convert((point.easting, point.northing))
                .map_err(|e| Error::Projection(e.to_string()))
        })?;
        Ok(Coord {
            x: lon - self.correction.lon,
            y: lat - self.correction.lat,
        })
    }

    /// Deviation of the transformed reference point from its WGS84 position.
    pub fn calibration_error(&self) -> Result<(f64, f64)> {
        let actual = self.transform(REFERENCE_PROJECTED)?;
        Ok((
            actual.x - REFERENCE_WGS84.x,
            actual.y - REFERENCE_WGS84.y,
        ))
    }
}
