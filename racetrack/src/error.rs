use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

use ql::prelude::QlError;

#[derive(Debug)]
pub enum RaceTrackError {
    /// Malformed track definition; `line` is 1-based
    TrackFormat { line: usize, message: String },
    Io { path: PathBuf, source: io::Error },
    /// Another run holds the lease on that Q-table file
    TableBusy(PathBuf),
    Ql(QlError),
}

impl RaceTrackError {
    pub fn track_format(line: usize, message: impl Into<String>) -> Self {
        RaceTrackError::TrackFormat {
            line,
            message: message.into(),
        }
    }
}

impl Display for RaceTrackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceTrackError::TrackFormat { line, message } => write!(f, "track definition line {}: {}", line, message),
            RaceTrackError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            RaceTrackError::TableBusy(path) => write!(f, "Q-table {} is in use by another run", path.display()),
            RaceTrackError::Ql(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for RaceTrackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RaceTrackError::Io { source, .. } => Some(source),
            RaceTrackError::Ql(e) => std::error::Error::source(e),
            _ => None,
        }
    }
}

impl From<QlError> for RaceTrackError {
    fn from(e: QlError) -> Self {
        RaceTrackError::Ql(e)
    }
}
