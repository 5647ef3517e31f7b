//! Marks Swiss municipalities as visited, planned or unvisited from recorded
//! GPS tracks and writes the result as two GeoJSON feature collections.

pub mod boundary;
pub mod classify;
pub mod config;
pub mod error;
pub mod io;
pub mod municipality;
pub mod parsers;
pub mod reprojection;
pub mod tracks;

use log::{info, warn};

pub use boundary::{BoundaryFields, load_municipalities};
pub use classify::{ClassificationResult, ClassificationSummary, classify};
pub use config::{Config, TrackSource};
pub use error::{Error, Result};
pub use io::{read_feature_collection, write_feature_collection};
pub use municipality::{Boundary, Municipality};
pub use reprojection::{Correction, ProjectedPoint, Reprojection};
pub use tracks::{ActivityCategory, CategoryFilter, DatePolicy, Track, load_tracks};

pub const DATA_DIR: &str = "data";
pub const BOUNDARY_PATH: &str = "data/boundaries/swissBOUNDARIES3D_1_5_TLM_HOHEITSGEBIET.shp";
pub const DONE_TRACKS_DIR: &str = "data/tracks";
pub const VISITED_PATH: &str = "data/visited.geojson";
pub const TODO_PATH: &str = "data/todo.geojson";

/// Largest accepted deviation of the calibration point, in degrees.
pub const CALIBRATION_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub done_tracks: usize,
    pub planned_tracks: usize,
    pub municipalities: ClassificationSummary,
}

fn load_track_source(source: &TrackSource, policy: DatePolicy) -> Result<Vec<Track>> {
    let filter = source.filter()?;
    load_tracks(&source.dir, filter.as_ref(), policy)
}

/// Runs the whole batch: load, classify, write both collections.
pub fn run(config: &Config) -> Result<RunSummary> {
    config.validate()?;

    let reprojection = Reprojection::new(config.correction);
    let (d_lon, d_lat) = reprojection.calibration_error()?;
    if d_lon.abs() > CALIBRATION_TOLERANCE || d_lat.abs() > CALIBRATION_TOLERANCE {
        warn!(
            "✗ Calibration point is off by ({:.7}°, {:.7}°)",
            d_lon, d_lat
        );
    } else {
        info!(
            "✓ Calibration point within ({:.7}°, {:.7}°), applying correction ({}°, {}°)",
            d_lon, d_lat, config.correction.lon, config.correction.lat
        );
    }

    let (municipalities, tracks) = rayon::join(
        || load_municipalities(&config.boundaries, &config.fields, &reprojection),
        || -> Result<(Vec<Track>, Vec<Track>)> {
            let done = load_track_source(&config.done, config.date_policy)?;
            let planned = match &config.planned {
                Some(source) => load_track_source(source, config.date_policy)?,
                None => Vec::new(),
            };
            Ok((done, planned))
        },
    );
    let municipalities = municipalities?;
    let (done, planned) = tracks?;

    let result = classify(municipalities, &done, &planned);

    write_feature_collection(&result.visited, &config.visited_output)?;
    write_feature_collection(&result.todo, &config.todo_output)?;

    Ok(RunSummary {
        done_tracks: done.len(),
        planned_tracks: planned.len(),
        municipalities: result.summary(),
    })
}
