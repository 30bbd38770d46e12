use std::thread;
use std::time::Duration;

use ql::prelude::{DiscreteState, QTable};
use racetrack::error::RaceTrackError;
use racetrack::lease::TableLease;
use racetrack::learn::evaluator::Evaluator;
use racetrack::learn::session::Termination;
use racetrack::learn::trainer::{SessionOutcome, Trainer, TrainingConfig};
use racetrack::observer::SharedSnapshot;
use racetrack::vehicle::VehicleParameter;

mod common;

#[test]
fn test_finish_on_first_step() {
    let dir = tempfile::tempdir().unwrap();
    let table_file = dir.path().join("last_qtable.bin");
    let snapshots = SharedSnapshot::new();
    let config = TrainingConfig {
        episode_count: 1,
        seed: Some(1),
        save_path: Some(table_file.clone()),
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(common::track(common::START_IN_FINISH_TRACK), config)
        .unwrap()
        .with_observer(Box::new(snapshots.clone()));

    assert_eq!(trainer.run().unwrap(), SessionOutcome::Completed);

    let step = snapshots.latest_step().unwrap();
    assert_eq!(step.step, 1);
    assert!(step.finished);
    assert!(!step.collided);
    assert_eq!(step.reward, 10_000.0);

    let records = snapshots.episodes();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].termination, Termination::Finished);
    assert_eq!(records[0].total_reward, 10_000.0);
    assert_eq!(records[0].steps, 1);
    // recorded after the finish halving, before the best-reward decay
    assert_eq!(records[0].exploration_rate, 0.5);

    // halved on finish, then decayed for the new best reward
    assert!((trainer.agent().exploration_rate() - 0.4).abs() < 1e-9);
    // all walls are far away from the start
    let start = DiscreteState::new(3, 3, 3).unwrap();
    assert!((trainer.agent().committed_table().max_value(start) - 500.0).abs() < 1e-3);

    assert_eq!(&QTable::load(&table_file).unwrap(), trainer.agent().committed_table());
    assert!(!dir.path().join("last_qtable.bin.lock").exists());
}

#[test]
fn test_cancel_before_first_step_keeps_committed_table() {
    let dir = tempfile::tempdir().unwrap();
    let table_file = dir.path().join("t.bin");
    let config = TrainingConfig {
        episode_count: 10,
        save_path: Some(table_file.clone()),
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(common::classic_track(), config).unwrap();
    trainer.cancellation_token().cancel();

    assert_eq!(trainer.run().unwrap(), SessionOutcome::Cancelled);
    assert_eq!(trainer.agent().committed_table(), &QTable::new());
    assert!(trainer.session().records.is_empty());
    assert!(!table_file.exists());
}

#[test]
fn test_training_refuses_a_leased_table() {
    let dir = tempfile::tempdir().unwrap();
    let table_file = dir.path().join("t.bin");
    let _lease = TableLease::acquire(&table_file).unwrap();
    let config = TrainingConfig {
        episode_count: 1,
        save_path: Some(table_file.clone()),
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(common::classic_track(), config).unwrap();
    assert!(matches!(trainer.run(), Err(RaceTrackError::TableBusy(_))));
    assert!(trainer.session().records.is_empty());
}

#[test]
fn test_capped_session_then_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let table_file = dir.path().join("last_qtable.bin");
    let config = TrainingConfig {
        episode_count: 8,
        max_steps_per_episode: Some(150),
        seed: Some(42),
        save_path: Some(table_file.clone()),
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(common::classic_track(), config).unwrap();
    assert_eq!(trainer.run().unwrap(), SessionOutcome::Completed);
    assert_eq!(trainer.session().records.len(), 8);
    assert!(table_file.exists());

    let mut evaluator = Evaluator::new(common::classic_track(), VehicleParameter::default())
        .unwrap()
        .with_max_steps(Some(500));
    let first = evaluator.run_table_file(&table_file).unwrap();
    let second = evaluator.run_table_file(&table_file).unwrap();
    assert_eq!(first, second);
    assert!(first.steps >= 1 && first.steps <= 500);
    assert_ne!(first.termination, Termination::Cancelled);
}

#[test]
fn test_cancel_from_another_thread() {
    let snapshots = SharedSnapshot::new();
    let config = TrainingConfig {
        episode_count: 1_000_000,
        max_steps_per_episode: Some(50),
        seed: Some(3),
        ..TrainingConfig::default()
    };
    let mut trainer = Trainer::new(common::classic_track(), config)
        .unwrap()
        .with_observer(Box::new(snapshots.clone()));
    let cancel = trainer.cancellation_token();

    let handle = thread::spawn(move || {
        let outcome = trainer.run().unwrap();
        (outcome, trainer.session().records.len())
    });
    while snapshots.latest_step().is_none() {
        thread::sleep(Duration::from_millis(1));
    }
    cancel.cancel();

    let (outcome, records) = handle.join().unwrap();
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(records, snapshots.episodes().len());
}
