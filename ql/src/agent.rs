use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::{SteeringAction, MAX_STEERING_DEGREES, MIN_STEERING_DEGREES};
use crate::prelude::{QlError, Result};
use crate::q_table::QTable;
use crate::state::{DiscreteState, SensorBins, SensorReading, DEFAULT_SENSOR_BINS};
use crate::util::immutable::Immutable;

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// Learning rate α (0 <= α <= 1); how far a single update moves the stored value towards the target
    pub learning_rate: f32,
    /// Discount rate γ (0 <= γ <= 1) represents the value of future rewards. The bigger, the more farsighted the agent becomes
    pub discount_factor: f32,
    /// Epsilon greedy parameter; probability of taking a random action
    pub exploration_rate: f64,
    /// Factor applied to the exploration rate each time a session reaches a new best episode reward
    pub exploration_decay: f64,
    /// Ascending distance thresholds used to discretize sensor readings
    pub sensor_bins: [f32; 3],
    /// Seed for the exploration random source; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Parameter {
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("learning_rate", self.learning_rate as f64)?;
        check_unit_interval("discount_factor", self.discount_factor as f64)?;
        check_unit_interval("exploration_rate", self.exploration_rate)?;
        check_unit_interval("exploration_decay", self.exploration_decay)?;
        SensorBins::new(self.sensor_bins)?;
        Ok(())
    }
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            discount_factor: 0.8,
            exploration_rate: 1.0,
            exploration_decay: 0.8,
            sensor_bins: DEFAULT_SENSOR_BINS,
            seed: None,
        }
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(QlError::config(field, value, "must be within [0, 1]"))
    }
}

/// Tabular Q-learning agent.
///
/// Learns into a working table on every step. The committed table is a snapshot of the
/// working table, taken only via [QLearningAgent::commit], and is the only table which
/// gets persisted or used for evaluation runs.
pub struct QLearningAgent {
    param: Immutable<Parameter>,
    bins: SensorBins,
    rng: StdRng,
    exploration_rate: f64,
    working: QTable,
    committed: QTable,
}

impl QLearningAgent {
    pub fn new(param: Parameter) -> Result<Self> {
        param.validate()?;
        let bins = SensorBins::new(param.sensor_bins)?;
        let rng = match param.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        log::debug!(
            "Q-learning agent: α={:.3}, γ={:.3}, 𝜀={:.3}, decay={:.3}, bins={:?}",
            param.learning_rate,
            param.discount_factor,
            param.exploration_rate,
            param.exploration_decay,
            param.sensor_bins
        );
        Ok(Self {
            exploration_rate: param.exploration_rate,
            param: Immutable::new(param),
            bins,
            rng,
            working: QTable::new(),
            committed: QTable::new(),
        })
    }

    /// Agent for evaluation runs: no exploration, committed table read from `path`
    pub fn for_evaluation(sensor_bins: [f32; 3], path: &Path) -> Result<Self> {
        let mut agent = QLearningAgent::new(Parameter {
            exploration_rate: 0.0,
            sensor_bins,
            ..Parameter::default()
        })?;
        agent.load(path)?;
        Ok(agent)
    }

    pub fn parameter(&self) -> &Parameter {
        &self.param
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration_rate
    }

    pub fn discretize(&self, reading: &SensorReading) -> DiscreteState {
        self.bins.discretize(reading)
    }

    /// Epsilon greedy action selection on the working table
    pub fn select_action(&mut self, state: DiscreteState) -> SteeringAction {
        if self.rng.gen::<f64>() < self.exploration_rate {
            SteeringAction(self.rng.gen_range(MIN_STEERING_DEGREES..=MAX_STEERING_DEGREES))
        } else {
            self.working.best_action(state)
        }
    }

    /// Best known action of the committed table
    pub fn committed_action(&self, state: DiscreteState) -> SteeringAction {
        self.committed.best_action(state)
    }

    /// One-step Bellman update of the working table:
    /// `Q(s,a) += α * (reward + γ * max_a' Q(s',a') - Q(s,a))`
    ///
    /// Returns the new value. The table stays untouched if the result would not be finite.
    pub fn update(
        &mut self,
        state: DiscreteState,
        action: SteeringAction,
        reward: f32,
        next_state: DiscreteState,
    ) -> Result<f32> {
        if !reward.is_finite() {
            return Err(QlError::NonFiniteValue { what: "reward", value: reward });
        }
        let current = self.working.get(state, action);
        let max_next = self.working.max_value(next_state);
        let updated = current
            + self.param.learning_rate * (reward + self.param.discount_factor * max_next - current);
        if !updated.is_finite() {
            return Err(QlError::NonFiniteValue { what: "Q-value", value: updated });
        }
        self.working.set(state, action, updated);
        Ok(updated)
    }

    /// Replaces the committed table with a full copy of the working table
    pub fn commit(&mut self) {
        self.committed = self.working.clone();
        log::debug!("committed Q-table ({} visited states)", self.committed.visited_states());
    }

    pub fn decay_exploration(&mut self, factor: f64) {
        self.exploration_rate *= factor;
    }

    pub fn working_table(&self) -> &QTable {
        &self.working
    }

    pub fn committed_table(&self) -> &QTable {
        &self.committed
    }

    pub fn restore_working_table(&mut self, table: QTable) {
        self.working = table;
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.committed.save(path)
    }

    /// Replaces the committed table; the working table is left alone
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.committed = QTable::load(path)?;
        Ok(())
    }
}
