pub mod fit;
pub mod gpx;

use chrono::NaiveDate;
use geo::Coord;
use std::path::Path;

use crate::error::Result;

/// Points and start date read from one track file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrack {
    pub points: Vec<Coord<f64>>,
    /// UTC date of the first timestamped trackpoint.
    pub start_date: Option<NaiveDate>,
}

// extract a ParsedTrack from one file of a given type
pub trait TrackParser: Sync {
    fn accepts(&self, path: &Path) -> bool;

    fn parse(&self, path: &Path) -> Result<ParsedTrack>;

    fn name(&self) -> &'static str;
}

static PARSERS: [&dyn TrackParser; 2] = [&gpx::GpxParser, &fit::FitParser];

/// Parser responsible for the given file, if any.
pub fn parser_for(path: &Path) -> Option<&'static dyn TrackParser> {
    PARSERS.iter().copied().find(|parser| parser.accepts(path))
}

pub(crate) fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
}
