use std::path::Path;
use std::sync::Arc;

use ql::prelude::QLearningAgent;
use ql::state::DEFAULT_SENSOR_BINS;
use ql::util::format::count;

use crate::error::RaceTrackError;
use crate::lease::TableLease;
use crate::learn::cancellation::CancellationToken;
use crate::learn::session::Termination;
use crate::observer::{NoopObserver, SimulationObserver, StepSnapshot};
use crate::reward::StepStatus;
use crate::track::{Pose, TrackGeometry};
use crate::vehicle::{Vehicle, VehicleParameter};

pub const DEFAULT_EVALUATION_MAX_STEPS: usize = 10_000;

#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationReport {
    pub steps: usize,
    pub termination: Termination,
    /// Poses from start to the final position
    pub path: Vec<Pose>,
}

/// Drives a vehicle with the greedy actions of a committed table; no learning, no exploration.
pub struct Evaluator {
    track: Arc<TrackGeometry>,
    vehicle: VehicleParameter,
    sensor_bins: [f32; 3],
    max_steps: Option<usize>,
    observer: Box<dyn SimulationObserver + Send>,
    cancel: CancellationToken,
}

impl Evaluator {
    pub fn new(track: Arc<TrackGeometry>, vehicle: VehicleParameter) -> Result<Self, RaceTrackError> {
        vehicle.validate()?;
        Ok(Self {
            track,
            vehicle,
            sensor_bins: DEFAULT_SENSOR_BINS,
            max_steps: Some(DEFAULT_EVALUATION_MAX_STEPS),
            observer: Box::new(NoopObserver),
            cancel: CancellationToken::new(),
        })
    }

    /// Must match the bins the table was trained with
    pub fn with_sensor_bins(mut self, sensor_bins: [f32; 3]) -> Self {
        self.sensor_bins = sensor_bins;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn SimulationObserver + Send>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Evaluates the table persisted at `path`, holding its lease meanwhile
    pub fn run_table_file(&mut self, path: &Path) -> Result<EvaluationReport, RaceTrackError> {
        let _lease = TableLease::acquire(path)?;
        let agent = QLearningAgent::for_evaluation(self.sensor_bins, path)?;
        log::info!(
            "evaluating {} ({} visited states, bins {:?})",
            path.display(),
            count(agent.committed_table().visited_states()),
            agent.parameter().sensor_bins
        );
        Ok(self.run(&agent))
    }

    pub fn run(&mut self, agent: &QLearningAgent) -> EvaluationReport {
        let mut vehicle = Vehicle::new(Arc::clone(&self.track), self.vehicle);
        let mut path = vec![vehicle.pose()];
        let mut state = agent.discretize(&vehicle.sensor_readings());
        let mut steps: usize = 0;

        let termination = loop {
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if self.max_steps.is_some_and(|max| steps >= max) {
                break Termination::Truncated;
            }

            let action = agent.committed_action(state);
            vehicle.set_heading_command(action.degrees() as f32);
            vehicle.advance();
            steps += 1;
            path.push(vehicle.pose());

            let reading = vehicle.sensor_readings();
            let status = StepStatus::of(&vehicle);
            self.observer.on_step(&StepSnapshot {
                episode: 0,
                step: steps,
                pose: vehicle.pose(),
                reading,
                collided: status == StepStatus::Collided,
                finished: status == StepStatus::Finished,
                reward: 0.0,
            });

            match status {
                StepStatus::Finished => break Termination::Finished,
                StepStatus::Collided => break Termination::Collided,
                StepStatus::Driving => state = agent.discretize(&reading),
            }
        };

        log::info!("evaluation run {} after {} steps", termination, count(steps));
        EvaluationReport {
            steps,
            termination,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use ql::prelude::{Parameter, QTable, QlError};

    use crate::observer::SharedSnapshot;
    use crate::track::tests::CLASSIC_TRACK;

    use super::*;

    fn classic_track() -> Arc<TrackGeometry> {
        Arc::new(CLASSIC_TRACK.parse().unwrap())
    }

    fn zero_agent() -> QLearningAgent {
        QLearningAgent::new(Parameter {
            exploration_rate: 0.0,
            ..Parameter::default()
        })
        .unwrap()
    }

    #[test]
    fn test_zero_table_run_is_deterministic() {
        let agent = zero_agent();
        let mut evaluator = Evaluator::new(classic_track(), VehicleParameter::default()).unwrap();
        let a = evaluator.run(&agent);
        let b = evaluator.run(&agent);
        assert_eq!(a, b);
        assert!(a.steps > 0);
        assert_eq!(a.path.len(), a.steps + 1);
        assert_eq!(a.path[0], Pose::new(0.0, 0.0, 90.0));
        // the untrained table always steers -45°
        assert!((a.path[1].heading - 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_step_cap_truncates() {
        let track: Arc<TrackGeometry> = Arc::new("0,0,90\n-1,200\n1,199\n-10,-10\n10,-10\n10,100\n-10,100".parse().unwrap());
        let mut evaluator = Evaluator::new(track, VehicleParameter::default())
            .unwrap()
            .with_max_steps(Some(1));
        let report = evaluator.run(&zero_agent());
        assert_eq!(report.steps, 1);
        assert_eq!(report.termination, Termination::Truncated);
    }

    #[test]
    fn test_observer_sees_every_step() {
        let snapshots = SharedSnapshot::new();
        let mut evaluator = Evaluator::new(classic_track(), VehicleParameter::default())
            .unwrap()
            .with_observer(Box::new(snapshots.clone()));
        let report = evaluator.run(&zero_agent());
        let last = snapshots.latest_step().unwrap();
        assert_eq!(last.step, report.steps);
        assert_eq!(last.pose, *report.path.last().unwrap());
        assert_eq!(last.collided, report.termination == Termination::Collided);
    }

    #[test]
    fn test_table_file_is_read_with_given_bins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        QTable::new().save(&path).unwrap();

        let mut evaluator = Evaluator::new(classic_track(), VehicleParameter::default())
            .unwrap()
            .with_sensor_bins([2.0, 5.0, 20.0])
            .with_max_steps(Some(3));
        assert!(evaluator.run_table_file(&path).unwrap().steps >= 1);

        let mut evaluator = Evaluator::new(classic_track(), VehicleParameter::default())
            .unwrap()
            .with_sensor_bins([7.0, 3.0, 12.0]);
        match evaluator.run_table_file(&path) {
            Err(RaceTrackError::Ql(QlError::ConfigValidation { field, .. })) => assert_eq!(field, "sensor_bins"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut evaluator = Evaluator::new(classic_track(), VehicleParameter::default()).unwrap();
        let result = evaluator.run_table_file(&dir.path().join("none.bin"));
        assert!(matches!(result, Err(RaceTrackError::Ql(_))));
        // the lease was released again
        assert!(!dir.path().join("none.bin.lock").exists());
    }
}
