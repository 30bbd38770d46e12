use std::fmt::{Display, Formatter};

use crate::prelude::{QlError, Result};

pub const MIN_STEERING_DEGREES: i8 = -45;
pub const MAX_STEERING_DEGREES: i8 = 45;
/// Number of possible actions (1° resolution)
pub const ACTION_SPACE: usize = (MAX_STEERING_DEGREES as i32 - MIN_STEERING_DEGREES as i32 + 1) as usize;

/// Heading delta in whole degrees, applied to the vehicle before it moves on.
///
/// Actions are ordered by ascending degrees, which is also the iteration order
/// used to break ties between equally valued actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SteeringAction(pub(crate) i8);

impl SteeringAction {
    pub fn try_from_degrees(degrees: i32) -> Result<Self> {
        if (MIN_STEERING_DEGREES as i32..=MAX_STEERING_DEGREES as i32).contains(&degrees) {
            Ok(SteeringAction(degrees as i8))
        } else {
            Err(QlError::InvalidAction(degrees))
        }
    }

    /// Identifying the action as a unique value in range `0..ACTION_SPACE`
    pub fn index(&self) -> usize {
        (self.0 as i32 - MIN_STEERING_DEGREES as i32) as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index < ACTION_SPACE {
            Some(SteeringAction((index as i32 + MIN_STEERING_DEGREES as i32) as i8))
        } else {
            None
        }
    }

    pub fn degrees(&self) -> i32 {
        self.0 as i32
    }

    pub fn all() -> impl Iterator<Item = SteeringAction> {
        (MIN_STEERING_DEGREES..=MAX_STEERING_DEGREES).map(SteeringAction)
    }
}

impl Display for SteeringAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+}°", self.0)
    }
}
