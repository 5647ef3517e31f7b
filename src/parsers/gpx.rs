use super::{ParsedTrack, TrackParser};
use crate::error::{Error, Result};
use geo::Coord;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct GpxParser;

impl TrackParser for GpxParser {
    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"))
    }

    fn parse(&self, path: &Path) -> Result<ParsedTrack> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        extract_points_from_gpx(BufReader::new(file), path)
    }

    fn name(&self) -> &'static str {
        "GPX Parser"
    }
}

/// Coordinate attributes of a `trkpt` as written in the file.
#[derive(Debug, Default)]
struct RawTrackPoint {
    lat: Option<String>,
    lon: Option<String>,
}

impl RawTrackPoint {
    // absent attributes default to 0, present ones must parse
    fn to_coord(&self, path: &Path) -> Result<Coord<f64>> {
        Ok(Coord {
            x: parse_coordinate(self.lon.as_deref(), "lon", path)?,
            y: parse_coordinate(self.lat.as_deref(), "lat", path)?,
        })
    }
}

fn parse_coordinate(value: Option<&str>, attribute: &str, path: &Path) -> Result<f64> {
    match value {
        None => Ok(0.0),
        Some(text) => text.trim().parse::<f64>().map_err(|_| {
            Error::parse(path, format!("invalid {} attribute '{}'", attribute, text))
        }),
    }
}

fn coordinate_attributes(element: &BytesStart, path: &Path) -> Result<RawTrackPoint> {
    let mut point = RawTrackPoint::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| Error::parse(path, e.to_string()))?;
        let value = || -> Result<String> {
            Ok(attr
                .unescape_value()
                .map_err(|e| Error::parse(path, e.to_string()))?
                .into_owned())
        };
        match attr.key.local_name().as_ref() {
            b"lat" => point.lat = Some(value()?),
            b"lon" => point.lon = Some(value()?),
            _ => {}
        }
    }
    Ok(point)
}

/// Reads every `trkpt` of a GPX document together with the timestamp of the first one.
pub fn extract_points_from_gpx<R: std::io::BufRead>(source: R, path: &Path) -> Result<ParsedTrack> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut raw_points = Vec::new();
    let mut first_time: Option<String> = None;
    let mut in_trkpt = false;
    let mut in_first_time = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(Error::parse(
                    path,
                    format!("XML error at position {}: {}", reader.buffer_position(), e),
                ));
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => {
                    raw_points.push(coordinate_attributes(&e, path)?);
                    in_trkpt = true;
                }
                b"time" if in_trkpt && raw_points.len() == 1 && first_time.is_none() => {
                    in_first_time = true;
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"trkpt" {
                    raw_points.push(coordinate_attributes(&e, path)?);
                }
            }
            Ok(Event::Text(text)) => {
                if in_first_time {
                    let value = text.unescape().map_err(|e| Error::parse(path, e.to_string()))?;
                    first_time = Some(value.into_owned());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"trkpt" => in_trkpt = false,
                b"time" => in_first_time = false,
                _ => {}
            },
            Ok(_) => {}
        }
        buf.clear();
    }

    // Coordinate parsing is independent per point
    let points = raw_points
        .par_iter()
        .map(|raw| raw.to_coord(path))
        .collect::<Result<Vec<_>>>()?;

    let start_date = match first_time {
        Some(time) => Some(
            crate::tracks::parse_timestamp_date(&time)
                .ok_or_else(|| Error::parse(path, format!("invalid timestamp '{}'", time)))?,
        ),
        None => None,
    };

    Ok(ParsedTrack { points, start_date })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(xml: &str) -> Result<ParsedTrack> {
        extract_points_from_gpx(xml.as_bytes(), Path::new("test.gpx"))
    }

    #[test]
    fn test_reads_points_and_first_time() {
        let track = parse(
            r#"<?xml version="1.0"?>
            <gpx version="1.1" xmlns="http://www.topografix.com/GPX/1/1">
              <trk><trkseg>
                <trkpt lat="46.5" lon="7.25"><ele>500</ele><time>2024-03-02T08:15:00Z</time></trkpt>
                <trkpt lat="46.6" lon="7.35"><time>2024-03-03T08:15:00Z</time></trkpt>
              </trkseg></trk>
            </gpx>"#,
        )
        .unwrap();
        assert_eq!(track.points, vec![Coord { x: 7.25, y: 46.5 }, Coord { x: 7.35, y: 46.6 }]);
        assert_eq!(track.start_date, NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let track = parse(r#"<gpx><trk><trkseg><trkpt lat="46.5"/><trkpt/></trkseg></trk></gpx>"#)
            .unwrap();
        assert_eq!(track.points, vec![Coord { x: 0.0, y: 46.5 }, Coord { x: 0.0, y: 0.0 }]);
        assert_eq!(track.start_date, None);
    }

    #[test]
    fn test_malformed_coordinate_fails() {
        let result = parse(r#"<gpx><trk><trkseg><trkpt lat="north" lon="7"/></trkseg></trk></gpx>"#);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_malformed_timestamp_fails() {
        let result = parse(
            r#"<gpx><trk><trkseg><trkpt lat="46" lon="7"><time>yesterday</time></trkpt></trkseg></trk></gpx>"#,
        );
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_waypoints_are_ignored() {
        let track = parse(r#"<gpx><wpt lat="1" lon="2"/><rte><rtept lat="3" lon="4"/></rte></gpx>"#)
            .unwrap();
        assert!(track.points.is_empty());
    }
}
