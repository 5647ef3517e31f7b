use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use geo::Coord;
use indicatif::ParallelProgressIterator;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::parsers::{self, TrackParser};

/// Date given to tracks whose date cannot be determined. Sorts after every real date.
pub fn undated() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Activity kinds a track can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActivityCategory {
    Cycling,
    Running,
    Walking,
    Hiking,
    Snowboarding,
    CrossCountrySkiing,
    DownhillSkiing,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 7] = [
        ActivityCategory::Cycling,
        ActivityCategory::Running,
        ActivityCategory::Walking,
        ActivityCategory::Hiking,
        ActivityCategory::Snowboarding,
        ActivityCategory::CrossCountrySkiing,
        ActivityCategory::DownhillSkiing,
    ];

    /// Substring identifying the category in an exported file name.
    pub fn pattern(self) -> &'static str {
        match self {
            ActivityCategory::Cycling => "Outdoor Cycling",
            ActivityCategory::Running => "Outdoor Running",
            ActivityCategory::Walking => "Outdoor Walking",
            ActivityCategory::Hiking => "Hiking",
            ActivityCategory::Snowboarding => "Snowboarding",
            ActivityCategory::CrossCountrySkiing => "Cross Country Skiing",
            ActivityCategory::DownhillSkiing => "Downhill Skiing",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ActivityCategory::Cycling => "cycling",
            ActivityCategory::Running => "running",
            ActivityCategory::Walking => "walking",
            ActivityCategory::Hiking => "hiking",
            ActivityCategory::Snowboarding => "snowboarding",
            ActivityCategory::CrossCountrySkiing => "cross-country-skiing",
            ActivityCategory::DownhillSkiing => "downhill-skiing",
        }
    }

    /// First category whose pattern occurs in the file name.
    pub fn detect(file_name: &str) -> Option<ActivityCategory> {
        ActivityCategory::ALL
            .into_iter()
            .find(|category| file_name.contains(category.pattern()))
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ActivityCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        ActivityCategory::ALL
            .into_iter()
            .find(|category| category.key() == wanted)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for ActivityCategory {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ActivityCategory> for String {
    fn from(category: ActivityCategory) -> Self {
        category.key().to_string()
    }
}

/// Checks that the category table covers every category once with a usable pattern.
pub fn validate_category_table() -> Result<()> {
    let mut patterns = HashSet::new();
    let mut keys = HashSet::new();
    for category in ActivityCategory::ALL {
        if category.pattern().is_empty() || !patterns.insert(category.pattern()) {
            return Err(Error::InvalidConfig(format!(
                "category {} has an empty or duplicate pattern",
                category
            )));
        }
        if !keys.insert(category.key()) {
            return Err(Error::InvalidConfig(format!("duplicate category key {}", category)));
        }
    }
    Ok(())
}

/// Non-empty set of categories a track file name must match to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    categories: Vec<ActivityCategory>,
}

impl CategoryFilter {
    pub fn new(categories: impl IntoIterator<Item = ActivityCategory>) -> Result<Self> {
        validate_category_table()?;
        let mut selected: Vec<ActivityCategory> = Vec::new();
        for category in categories {
            if !selected.contains(&category) {
                selected.push(category);
            }
        }
        if selected.is_empty() {
            return Err(Error::InvalidConfig(
                "category filter must name at least one category".to_string(),
            ));
        }
        selected.sort_by_key(|category| {
            ActivityCategory::ALL
                .iter()
                .position(|known| known == category)
        });
        Ok(CategoryFilter {
            categories: selected,
        })
    }

    pub fn all() -> Result<Self> {
        CategoryFilter::new(ActivityCategory::ALL)
    }

    /// Builds a filter from category names, rejecting unknown ones.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let categories = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<ActivityCategory>>>()?;
        CategoryFilter::new(categories)
    }

    pub fn categories(&self) -> &[ActivityCategory] {
        &self.categories
    }

    /// Category of the file if it passes the filter.
    pub fn matches(&self, file_name: &str) -> Option<ActivityCategory> {
        self.categories
            .iter()
            .copied()
            .find(|category| file_name.contains(category.pattern()))
    }
}

/// How a track's representative date is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatePolicy {
    /// UTC date of the first trackpoint's timestamp.
    #[default]
    FirstPointTimestamp,
    /// Leading `YYYY-MM-DD` of the file name.
    FileNamePrefix,
}

impl FromStr for DatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "first-point-timestamp" | "timestamp" => Ok(DatePolicy::FirstPointTimestamp),
            "file-name-prefix" | "filename" => Ok(DatePolicy::FileNamePrefix),
            other => Err(Error::InvalidConfig(format!("unknown date policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub source: PathBuf,
    pub category: Option<ActivityCategory>,
    pub date: NaiveDate,
    pub points: Vec<Coord<f64>>,
}

impl Track {
    pub fn new(date: NaiveDate, points: Vec<Coord<f64>>) -> Self {
        Track {
            source: PathBuf::new(),
            category: None,
            date,
            points,
        }
    }
}

/// Stable sort by date, oldest first.
pub fn sort_chronologically(tracks: &mut [Track]) {
    tracks.sort_by_key(|track| track.date);
}

/// Parses an RFC 3339 timestamp, or a naive one taken as UTC, to its UTC date.
pub fn parse_timestamp_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.date())
}

/// Leading `YYYY-MM-DD` of a file name. A name without that shape has no date;
/// a name with the shape but an impossible date is an error.
pub fn date_from_file_name(path: &Path) -> Result<Option<NaiveDate>> {
    let name = parsers::file_name(path);
    let Some(prefix) = name.get(..10) else {
        return Ok(None);
    };
    let shaped = prefix.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shaped {
        return Ok(None);
    }
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| Error::parse(path, format!("invalid date '{}' in file name: {}", prefix, e)))
}

fn load_track(
    path: &Path,
    parser: &dyn TrackParser,
    category: Option<ActivityCategory>,
    policy: DatePolicy,
) -> Result<Track> {
    let parsed = parser.parse(path)?;
    if parsed.points.is_empty() {
        return Err(Error::EmptyTrack {
            path: path.to_path_buf(),
        });
    }

    let date = match policy {
        DatePolicy::FirstPointTimestamp => parsed.start_date,
        DatePolicy::FileNamePrefix => date_from_file_name(path)?,
    };

    Ok(Track {
        source: path.to_path_buf(),
        category,
        date: date.unwrap_or_else(undated),
        points: parsed.points,
    })
}

/// Loads every track file under `dir`, sorted by date.
///
/// Files yielding no points are skipped with a warning. Any other error
/// aborts the load.
pub fn load_tracks(
    dir: &Path,
    filter: Option<&CategoryFilter>,
    policy: DatePolicy,
) -> Result<Vec<Track>> {
    info!("Searching for track files in {} directory...", dir.display());

    if !dir.is_dir() {
        return Err(Error::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "track directory not found"),
        ));
    }

    let mut track_files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(parser) = parsers::parser_for(path) else {
            continue;
        };
        let name = parsers::file_name(path);
        let category = match filter {
            Some(filter) => match filter.matches(name) {
                Some(category) => Some(category),
                None => continue,
            },
            None => ActivityCategory::detect(name),
        };
        track_files.push((path.to_path_buf(), parser, category));
    }

    info!("Found {} track files", track_files.len());

    let loaded: Vec<Option<Track>> = track_files
        .into_par_iter()
        .progress()
        .map(
            |(path, parser, category)| match load_track(&path, parser, category, policy) {
                Ok(track) => Ok(Some(track)),
                Err(e) if e.is_skippable() => {
                    warn!("✗ Skipping {}", e);
                    Ok(None)
                }
                Err(e) => Err(e),
            },
        )
        .collect::<Result<_>>()?;

    let mut tracks: Vec<Track> = loaded.into_iter().flatten().collect();
    sort_chronologically(&mut tracks);

    info!("✓ Loaded {} tracks from {}", tracks.len(), dir.display());
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_table_is_valid() {
        assert!(validate_category_table().is_ok());
    }

    #[test]
    fn test_timestamp_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_timestamp_date("2024-05-01T10:00:00Z"), date);
        assert_eq!(parse_timestamp_date("2024-05-01T10:00:00.250Z"), date);
        assert_eq!(parse_timestamp_date("2024-05-01T10:00:00"), date);
        assert_eq!(parse_timestamp_date("2024-05-01T23:30:00+02:00"), date);
        // shortly after local midnight is still the previous UTC day
        assert_eq!(parse_timestamp_date("2024-05-02T01:30:00+02:00"), date);
        assert_eq!(parse_timestamp_date("not a time"), None);
    }

    #[test]
    fn test_undated_sorts_last() {
        let mut tracks = vec![
            Track::new(undated(), vec![Coord { x: 0.0, y: 0.0 }]),
            Track::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), vec![Coord { x: 0.0, y: 0.0 }]),
        ];
        sort_chronologically(&mut tracks);
        assert_eq!(tracks[1].date, undated());
    }
}
