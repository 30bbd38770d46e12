use ql::prelude::SensorReading;

use crate::vehicle::Vehicle;

pub const FINISH_REWARD: f32 = 10_000.0;
pub const COLLISION_REWARD: f32 = -10.0;
/// Exploration rate factor applied whenever the vehicle reaches the finish
pub const FINISH_EXPLORATION_FACTOR: f64 = 0.5;

/// Vehicle condition after a step. Finish wins over collision, so at most one of both is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    Finished,
    Collided,
    Driving,
}

impl StepStatus {
    pub fn of(vehicle: &Vehicle) -> Self {
        if vehicle.reached_finish() {
            StepStatus::Finished
        } else if vehicle.has_collided() {
            StepStatus::Collided
        } else {
            StepStatus::Driving
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Driving)
    }
}

/// Reward of one step; `step` is the zero-based step index within the episode.
pub fn reward(status: StepStatus, reading: &SensorReading, step: usize) -> f32 {
    match status {
        StepStatus::Finished => FINISH_REWARD,
        StepStatus::Collided => COLLISION_REWARD,
        StepStatus::Driving => driving_reward(reading, step),
    }
}

/// Proximity shaping, replaced by a progress bonus once the episode runs long enough
/// (after 50 steps the vehicle has usually passed the second corner).
pub fn driving_reward(reading: &SensorReading, step: usize) -> f32 {
    if step > 50 {
        return if reading.front > 10.0 { 20.0 } else { 5.0 };
    }
    if step > 30 {
        return 2.0;
    }
    proximity_reward(reading)
}

/// A front reading farther than both sides means a straight section, so the wall ahead matters.
/// Otherwise the vehicle is in a turn and the nearer side wall matters.
pub fn proximity_reward(reading: &SensorReading) -> f32 {
    let min_side = reading.min_side();
    if reading.front > min_side {
        match reading.front {
            d if d < 5.0 => -5.0,
            d if d < 10.0 => -1.0,
            _ => 1.0,
        }
    } else {
        match min_side {
            d if d < 5.0 => -5.0,
            d if d < 12.0 => -1.0,
            _ => 1.0,
        }
    }
}
