use std::path::PathBuf;
use std::sync::Arc;

use itertools::Itertools;
use ql::prelude::{Parameter, QLearningAgent, QlError};
use ql::state::DEFAULT_SENSOR_BINS;
use ql::util::format::count;
use ql::util::immutable::Immutable;
use rustc_hash::FxHashMap;

use crate::error::RaceTrackError;
use crate::lease::TableLease;
use crate::learn::cancellation::CancellationToken;
use crate::learn::session::{EpisodeRecord, RewardWindow, SessionState, Termination};
use crate::observer::{NoopObserver, SimulationObserver, StepSnapshot};
use crate::reward::{reward, StepStatus, FINISH_EXPLORATION_FACTOR};
use crate::track::TrackGeometry;
use crate::vehicle::{Vehicle, VehicleParameter};

const REWARD_WINDOW_LEN: usize = 20;
const LOGGED_TOP_ACTIONS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub exploration_rate: f64,
    /// Applied to the exploration rate whenever an episode beats the best total reward so far
    pub exploration_decay: f64,
    pub episode_count: usize,
    /// Safety cap; `None` lets an episode run until finish or collision
    pub max_steps_per_episode: Option<usize>,
    pub sensor_bins: [f32; 3],
    pub seed: Option<u64>,
    pub vehicle: VehicleParameter,
    /// Where the committed table goes after a completed session
    pub save_path: Option<PathBuf>,
}

impl TrainingConfig {
    pub fn agent_parameter(&self) -> Parameter {
        Parameter {
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            exploration_rate: self.exploration_rate,
            exploration_decay: self.exploration_decay,
            sensor_bins: self.sensor_bins,
            seed: self.seed,
        }
    }

    pub fn validate(&self) -> Result<(), QlError> {
        self.agent_parameter().validate()?;
        self.vehicle.validate()?;
        if self.episode_count == 0 {
            return Err(QlError::config("episode_count", self.episode_count, "must be positive"));
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(QlError::config("max_steps_per_episode", 0, "must be positive when set"));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let agent = Parameter::default();
        Self {
            learning_rate: agent.learning_rate,
            discount_factor: agent.discount_factor,
            exploration_rate: agent.exploration_rate,
            exploration_decay: agent.exploration_decay,
            episode_count: 300,
            max_steps_per_episode: None,
            sensor_bins: DEFAULT_SENSOR_BINS,
            seed: None,
            vehicle: VehicleParameter::default(),
            save_path: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// Runs training episodes of one agent on one track, strictly one after another.
///
/// The working table learns on every step. It gets committed whenever the vehicle reaches the finish
/// and whenever an episode beats the best total reward of the session.
pub struct Trainer {
    track: Arc<TrackGeometry>,
    config: Immutable<TrainingConfig>,
    agent: QLearningAgent,
    session: SessionState,
    observer: Box<dyn SimulationObserver + Send>,
    cancel: CancellationToken,
    reward_window: RewardWindow,
}

impl Trainer {
    pub fn new(track: Arc<TrackGeometry>, config: TrainingConfig) -> Result<Self, RaceTrackError> {
        config.validate()?;
        let agent = QLearningAgent::new(config.agent_parameter())?;
        Ok(Self {
            track,
            session: SessionState::new(config.exploration_rate),
            config: Immutable::new(config),
            agent,
            observer: Box::new(NoopObserver),
            cancel: CancellationToken::new(),
            reward_window: RewardWindow::new(REWARD_WINDOW_LEN),
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn SimulationObserver + Send>) -> Self {
        self.observer = observer;
        self
    }

    /// Token to stop the session from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Plays all configured episodes; the committed table is saved to `save_path` when the session completes
    pub fn run(&mut self) -> Result<SessionOutcome, RaceTrackError> {
        let _lease = match &self.config.save_path {
            Some(path) => Some(TableLease::acquire(path)?),
            None => None,
        };
        let param = self.agent.parameter();
        log::info!(
            "training {} episodes (α={:.3}, γ={:.3}, 𝜀={:.3}, bins {:?}, step cap {:?})",
            count(self.config.episode_count),
            param.learning_rate,
            param.discount_factor,
            self.agent.exploration_rate(),
            param.sensor_bins,
            self.config.max_steps_per_episode
        );

        for episode in 0..self.config.episode_count {
            let record = self.learn_episode(episode)?;
            if record.termination == Termination::Cancelled {
                log::info!("training cancelled during episode {}", count(episode));
                return Ok(SessionOutcome::Cancelled);
            }
            self.complete_episode(record);
        }

        log::info!(
            "training done: {} episodes, {} finished, best reward {:.1}",
            count(self.session.episode_count()),
            count(self.session.finish_count()),
            self.session.best_reward
        );
        if let Some(path) = &self.config.save_path {
            self.agent.save(path)?;
            log::info!("saved committed Q-table to {}", path.display());
        }
        Ok(SessionOutcome::Completed)
    }

    /// Plays one episode. On failure the working table is rolled back to its state at episode start.
    pub fn learn_episode(&mut self, episode: usize) -> Result<EpisodeRecord, RaceTrackError> {
        let snapshot = self.agent.working_table().clone();
        match self.play_episode(episode) {
            Ok(record) => Ok(record),
            Err(e) => {
                log::warn!("episode {} failed, rolling back its updates: {}", episode, e);
                self.agent.restore_working_table(snapshot);
                Err(e)
            }
        }
    }

    fn play_episode(&mut self, episode: usize) -> Result<EpisodeRecord, RaceTrackError> {
        let mut vehicle = Vehicle::new(Arc::clone(&self.track), self.config.vehicle);
        let mut state = self.agent.discretize(&vehicle.sensor_readings());
        let mut total_reward = 0.0_f32;
        let mut step: usize = 0;
        let mut actions: FxHashMap<i32, usize> = FxHashMap::default();

        let termination = loop {
            if self.cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if self.config.max_steps_per_episode.is_some_and(|max| step >= max) {
                break Termination::Truncated;
            }

            let action = self.agent.select_action(state);
            *actions.entry(action.degrees()).or_default() += 1;
            vehicle.set_heading_command(action.degrees() as f32);
            vehicle.advance();

            let reading = vehicle.sensor_readings();
            let next_state = self.agent.discretize(&reading);
            let status = StepStatus::of(&vehicle);
            let step_reward = reward(status, &reading, step);
            if status == StepStatus::Finished {
                self.agent.decay_exploration(FINISH_EXPLORATION_FACTOR);
                self.agent.commit();
                log::debug!("finish reached in episode {} after {} steps", episode, step + 1);
            }

            self.agent.update(state, action, step_reward, next_state)?;
            total_reward += step_reward;
            step += 1;
            log::trace!("{} {} -> {} reward {}", state, action, next_state, step_reward);

            self.observer.on_step(&StepSnapshot {
                episode,
                step,
                pose: vehicle.pose(),
                reading,
                collided: status == StepStatus::Collided,
                finished: status == StepStatus::Finished,
                reward: step_reward,
            });
            state = next_state;

            match status {
                StepStatus::Finished => break Termination::Finished,
                StepStatus::Collided => break Termination::Collided,
                StepStatus::Driving => {}
            }
        };

        let top_actions = actions
            .iter()
            .sorted_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)))
            .take(LOGGED_TOP_ACTIONS)
            .map(|(degrees, n)| format!("{:+}°×{}", degrees, count(*n)))
            .join(", ");
        log::debug!("episode {} actions: {}", episode, top_actions);

        Ok(EpisodeRecord {
            episode,
            total_reward,
            exploration_rate: self.agent.exploration_rate(),
            steps: step,
            termination,
        })
    }

    fn complete_episode(&mut self, record: EpisodeRecord) {
        self.session.records.push(record);
        self.reward_window.add(record.total_reward);
        if record.total_reward > self.session.best_reward {
            log::debug!("new best reward {:.1} (was {:.1})", record.total_reward, self.session.best_reward);
            self.session.best_reward = record.total_reward;
            self.agent.decay_exploration(self.config.exploration_decay);
            self.agent.commit();
        }
        self.session.exploration_rate = self.agent.exploration_rate();
        self.observer.on_episode(&record);

        log::info!(
            "episode {}: {} after {} steps, reward {:.1} (avg {:.1}, max {:.1} of last {}), 𝜀={:.4}",
            count(record.episode),
            record.termination,
            count(record.steps),
            record.total_reward,
            self.reward_window.avg(),
            self.reward_window.max(),
            self.reward_window.len(),
            self.session.exploration_rate
        );
    }
}
