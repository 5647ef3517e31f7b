use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Boundary record whose shape is not a polygon or multipolygon.
    #[error("unsupported geometry {kind} for municipality '{name}'")]
    UnsupportedGeometry { name: String, kind: String },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Track file without a single trackpoint. Callers skip these.
    #[error("track {} contains no points", path.display())]
    EmptyTrack { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error("failed to read shapefile {}: {source}", path.display())]
    Shapefile {
        path: PathBuf,
        #[source]
        source: shapefile::Error,
    },

    /// PROJ could not be set up or rejected a coordinate.
    #[error("coordinate transform failed: {0}")]
    Projection(String),

    #[error("failed to decode FIT file {}: {message}", path.display())]
    Fit { path: PathBuf, message: String },

    #[error("unknown activity category '{0}'")]
    UnknownCategory(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether the batch may continue after this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::EmptyTrack { .. })
    }
}
