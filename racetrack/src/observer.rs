use std::sync::{Arc, RwLock};

use ql::prelude::SensorReading;

use crate::learn::session::EpisodeRecord;
use crate::track::Pose;

/// Read-only view of the simulation after one step, e.g. for a renderer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepSnapshot {
    pub episode: usize,
    /// Number of steps taken so far in this episode (1 after the first step)
    pub step: usize,
    pub pose: Pose,
    pub reading: SensorReading,
    pub collided: bool,
    pub finished: bool,
    /// Reward of that step; zero during evaluation runs
    pub reward: f32,
}

/// Receives simulation progress. Called on the simulation thread, between two steps.
pub trait SimulationObserver {
    fn on_step(&mut self, _snapshot: &StepSnapshot) {}

    fn on_episode(&mut self, _record: &EpisodeRecord) {}
}

pub struct NoopObserver;

impl SimulationObserver for NoopObserver {}

/// Observer which keeps the latest step and the episode history behind shared locks,
/// so another thread (e.g. a UI) can poll them while a session runs.
#[derive(Clone, Default)]
pub struct SharedSnapshot {
    latest_step: Arc<RwLock<Option<StepSnapshot>>>,
    episodes: Arc<RwLock<Vec<EpisodeRecord>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest_step(&self) -> Option<StepSnapshot> {
        self.latest_step.read().ok().and_then(|guard| *guard)
    }

    pub fn episodes(&self) -> Vec<EpisodeRecord> {
        self.episodes.read().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl SimulationObserver for SharedSnapshot {
    fn on_step(&mut self, snapshot: &StepSnapshot) {
        if let Ok(mut guard) = self.latest_step.write() {
            *guard = Some(*snapshot);
        }
    }

    fn on_episode(&mut self, record: &EpisodeRecord) {
        if let Ok(mut guard) = self.episodes.write() {
            guard.push(*record);
        }
    }
}
