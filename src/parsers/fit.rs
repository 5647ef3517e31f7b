use super::{ParsedTrack, TrackParser, file_name};
use crate::error::{Error, Result};
use chrono::Utc;
use fitparser::{FitDataRecord, Value};
use flate2::read::GzDecoder;
use geo::Coord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/**
 * Parse .fit and .fit.gz activity files, as exported by Strava and most head units.
 */
pub struct FitParser;

impl TrackParser for FitParser {
    fn accepts(&self, path: &Path) -> bool {
        let name = file_name(path).to_ascii_lowercase();
        name.ends_with(".fit") || name.ends_with(".fit.gz")
    }

    fn parse(&self, path: &Path) -> Result<ParsedTrack> {
        let data = read_fit_bytes(path)?;
        let records = fitparser::from_bytes(&data).map_err(|e| Error::Fit {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(extract_track_from_records(&records))
    }

    fn name(&self) -> &'static str {
        "FIT Parser"
    }
}

fn read_fit_bytes(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut data = Vec::new();
    if file_name(path).to_ascii_lowercase().ends_with(".gz") {
        GzDecoder::new(file)
            .read_to_end(&mut data)
            .map_err(|e| Error::io(path, e))?;
    } else {
        let mut file = file;
        file.read_to_end(&mut data).map_err(|e| Error::io(path, e))?;
    }
    Ok(data)
}

fn extract_track_from_records(records: &[FitDataRecord]) -> ParsedTrack {
    let mut track = ParsedTrack::default();

    for record in records {
        if let Some(point) = extract_coordinates_from_record(record) {
            if track.start_date.is_none() {
                track.start_date = extract_date_from_record(record);
            }
            track.points.push(point);
        }
    }

    track
}

fn extract_coordinates_from_record(record: &FitDataRecord) -> Option<Coord<f64>> {
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    for field in record.fields() {
        match field.name() {
            "position_lat" => latitude = extract_coordinate_value(field.value()),
            "position_long" => longitude = extract_coordinate_value(field.value()),
            _ => {} // ignore other fields
        }
    }

    let (lat, lon) = (latitude?, longitude?);

    // convert from semicircles to degrees
    Some(Coord {
        x: semicircles_to_degrees(lon),
        y: semicircles_to_degrees(lat),
    })
}

fn extract_date_from_record(record: &FitDataRecord) -> Option<chrono::NaiveDate> {
    record
        .fields()
        .iter()
        .find(|field| field.name() == "timestamp")
        .and_then(|field| match field.value() {
            Value::Timestamp(timestamp) => Some(timestamp.with_timezone(&Utc).date_naive()),
            _ => None,
        })
}

fn semicircles_to_degrees(value: f64) -> f64 {
    value * (180.0 / 2_147_483_648.0)
}

fn extract_coordinate_value(value: &Value) -> Option<f64> {
    match value {
        Value::SInt32(v) => Some(*v as f64),
        Value::UInt32(v) => Some(*v as f64),
        Value::SInt16(v) => Some(*v as f64),
        Value::UInt16(v) => Some(*v as f64),
        Value::SInt8(v) => Some(*v as f64),
        Value::UInt8(v) => Some(*v as f64),
        Value::Float32(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicircle_conversion() {
        assert_eq!(semicircles_to_degrees(0.0), 0.0);
        assert_eq!(semicircles_to_degrees(1_073_741_824.0), 90.0);
        assert_eq!(semicircles_to_degrees(-1_073_741_824.0), -90.0);
    }

    #[test]
    fn test_accepts_fit_files() {
        assert!(FitParser.accepts(Path::new("2024-01-01 Outdoor Cycling.fit")));
        assert!(FitParser.accepts(Path::new("strava/123.FIT.GZ")));
        assert!(!FitParser.accepts(Path::new("ride.gpx")));
    }

    #[test]
    fn test_garbage_is_fit_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.fit");
        std::fs::write(&path, b"not a fit file").unwrap();
        assert!(matches!(FitParser.parse(&path), Err(Error::Fit { .. })));
    }
}
