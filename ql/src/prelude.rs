use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub use crate::action::{SteeringAction, ACTION_SPACE};
pub use crate::agent::{Parameter, QLearningAgent};
pub use crate::q_table::QTable;
pub use crate::state::{DiscreteState, SensorBins, SensorReading, STATE_SPACE};

pub type Result<T> = std::result::Result<T, QlError>;

#[derive(Debug)]
pub enum QlError {
    /// A tuning parameter is out of its allowed range
    ConfigValidation {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    /// A persisted table could not be written, read or decoded
    Persistence { path: PathBuf, reason: String },
    /// An update would put a non-finite number into the table
    NonFiniteValue { what: &'static str, value: f32 },
    /// Heading delta outside of the action space
    InvalidAction(i32),
}

impl QlError {
    pub fn config(field: &'static str, value: impl Display, reason: &'static str) -> Self {
        QlError::ConfigValidation {
            field,
            value: value.to_string(),
            reason,
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        QlError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl Display for QlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QlError::ConfigValidation { field, value, reason } => {
                write!(f, "invalid value {} for '{}': {}", value, field, reason)
            }
            QlError::Persistence { path, reason } => {
                write!(f, "Q-table file {}: {}", path.display(), reason)
            }
            QlError::NonFiniteValue { what, value } => write!(f, "non-finite {}: {}", what, value),
            QlError::InvalidAction(degrees) => write!(f, "steering action {}° out of range", degrees),
        }
    }
}

impl std::error::Error for QlError {}
