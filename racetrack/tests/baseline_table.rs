use std::fs;

use ql::prelude::{QLearningAgent, QTable};
use ql::state::DEFAULT_SENSOR_BINS;
use racetrack::learn::evaluator::Evaluator;
use racetrack::learn::session::Termination;
use racetrack::resources::baseline_table_file;
use racetrack::vehicle::VehicleParameter;

mod common;

#[test]
fn test_baseline_table_is_complete_and_trained() {
    let table = QTable::load(&baseline_table_file()).unwrap();
    assert!(table.visited_states() > 0);
    assert_ne!(table, QTable::new());
}

#[test]
fn test_baseline_table_drives_the_classic_track_to_the_finish() {
    let agent = QLearningAgent::for_evaluation(DEFAULT_SENSOR_BINS, &baseline_table_file()).unwrap();
    let mut evaluator = Evaluator::new(common::classic_track(), VehicleParameter::default()).unwrap();
    let report = evaluator.run(&agent);
    assert_eq!(report.termination, Termination::Finished);
    assert!(report.steps > 30 && report.steps < 200);
}

#[test]
fn test_baseline_table_file_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let table_file = dir.path().join("default_qtable.bin");
    fs::copy(baseline_table_file(), &table_file).unwrap();

    let mut evaluator = Evaluator::new(common::classic_track(), VehicleParameter::default()).unwrap();
    let first = evaluator.run_table_file(&table_file).unwrap();
    let second = evaluator.run_table_file(&table_file).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.termination, Termination::Finished);
}
