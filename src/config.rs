use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::boundary::BoundaryFields;
use crate::error::{Error, Result};
use crate::reprojection::Correction;
use crate::tracks::{ActivityCategory, CategoryFilter, DatePolicy};
use crate::{BOUNDARY_PATH, DONE_TRACKS_DIR, TODO_PATH, VISITED_PATH};

/// A directory of track files and the categories to keep from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSource {
    pub dir: PathBuf,
    /// `None` keeps every track file regardless of its name.
    #[serde(default)]
    pub categories: Option<Vec<ActivityCategory>>,
}

impl TrackSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TrackSource {
            dir: dir.into(),
            categories: None,
        }
    }

    pub fn filter(&self) -> Result<Option<CategoryFilter>> {
        self.categories
            .as_ref()
            .map(|categories| CategoryFilter::new(categories.iter().copied()))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub boundaries: PathBuf,
    pub fields: BoundaryFields,
    pub done: TrackSource,
    pub planned: Option<TrackSource>,
    pub date_policy: DatePolicy,
    pub visited_output: PathBuf,
    pub todo_output: PathBuf,
    pub correction: Correction,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            boundaries: PathBuf::from(BOUNDARY_PATH),
            fields: BoundaryFields::default(),
            done: TrackSource {
                dir: PathBuf::from(DONE_TRACKS_DIR),
                categories: Some(ActivityCategory::ALL.to_vec()),
            },
            planned: None,
            date_policy: DatePolicy::default(),
            visited_output: PathBuf::from(VISITED_PATH),
            todo_output: PathBuf::from(TODO_PATH),
            correction: Correction::default(),
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::parse(path, e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.done.filter()?;
        if let Some(planned) = &self.planned {
            planned.filter()?;
        }
        if self.visited_output == self.todo_output {
            return Err(Error::InvalidConfig(format!(
                "visited and todo outputs both point to {}",
                self.visited_output.display()
            )));
        }
        Ok(())
    }
}
