use std::sync::Arc;

use ql::prelude::{QlError, SensorReading};

use crate::algebra_2d::{direction, normalize_degrees};
use crate::track::{Pose, TrackGeometry};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleParameter {
    /// Distance covered per simulation step
    pub step_distance: f32,
    /// Angle between the front sensor and each side sensor
    pub sensor_angle_degrees: f32,
    /// The vehicle collides when its center gets closer than this to a wall (vehicle radius)
    pub min_clearance: f32,
}

impl VehicleParameter {
    pub fn validate(&self) -> Result<(), QlError> {
        if !(self.step_distance.is_finite() && self.step_distance > 0.0) {
            return Err(QlError::config("step_distance", self.step_distance, "must be a positive number"));
        }
        if !(self.sensor_angle_degrees.is_finite() && self.sensor_angle_degrees > 0.0 && self.sensor_angle_degrees < 180.0) {
            return Err(QlError::config("sensor_angle_degrees", self.sensor_angle_degrees, "must be within (0, 180)"));
        }
        if !(self.min_clearance.is_finite() && self.min_clearance >= 0.0) {
            return Err(QlError::config("min_clearance", self.min_clearance, "must not be negative"));
        }
        Ok(())
    }
}

impl Default for VehicleParameter {
    fn default() -> Self {
        Self {
            step_distance: 1.0,
            sensor_angle_degrees: 45.0,
            min_clearance: 3.0,
        }
    }
}

/// Point-shaped vehicle with three range sensors (front, front-left, front-right).
/// Besides its pose it carries no state.
#[derive(Clone, Debug)]
pub struct Vehicle {
    track: Arc<TrackGeometry>,
    param: VehicleParameter,
    pose: Pose,
}

impl Vehicle {
    /// Vehicle placed on the start pose of the track
    pub fn new(track: Arc<TrackGeometry>, param: VehicleParameter) -> Self {
        let pose = track.start();
        Self::at_pose(track, param, pose)
    }

    pub fn at_pose(track: Arc<TrackGeometry>, param: VehicleParameter, pose: Pose) -> Self {
        Self { track, param, pose }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Turns the heading by `delta_degrees` (counter-clockwise positive)
    pub fn set_heading_command(&mut self, delta_degrees: f32) {
        self.pose.heading = normalize_degrees(self.pose.heading + delta_degrees);
    }

    /// Moves one step along the current heading
    pub fn advance(&mut self) {
        let position = self.pose.position() + direction(self.pose.heading) * self.param.step_distance;
        self.pose.x = position.x;
        self.pose.y = position.y;
    }

    pub fn sensor_readings(&self) -> SensorReading {
        let origin = self.pose.position();
        let heading = self.pose.heading;
        let angle = self.param.sensor_angle_degrees;
        SensorReading::new(
            self.track.distance_to_boundary(&origin, heading),
            self.track.distance_to_boundary(&origin, heading + angle),
            self.track.distance_to_boundary(&origin, heading - angle),
        )
    }

    pub fn has_collided(&self) -> bool {
        self.track.collides(&self.pose.position(), self.param.min_clearance)
    }

    pub fn reached_finish(&self) -> bool {
        self.track.point_in_finish_zone(&self.pose.position())
    }
}
