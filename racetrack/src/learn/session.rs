use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

/// How an episode ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Finished,
    Collided,
    /// step cap reached
    Truncated,
    Cancelled,
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Termination::Finished => "finished",
            Termination::Collided => "collided",
            Termination::Truncated => "truncated",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeRecord {
    /// zero-based
    pub episode: usize,
    pub total_reward: f32,
    /// exploration rate at the end of the episode, before a best-reward decay
    pub exploration_rate: f64,
    pub steps: usize,
    pub termination: Termination,
}

/// Session progress, carried from one episode to the next
#[derive(Clone, Debug)]
pub struct SessionState {
    pub best_reward: f32,
    pub exploration_rate: f64,
    pub records: Vec<EpisodeRecord>,
}

impl SessionState {
    pub fn new(exploration_rate: f64) -> Self {
        Self {
            best_reward: 0.0,
            exploration_rate,
            records: vec![],
        }
    }

    pub fn episode_count(&self) -> usize {
        self.records.len()
    }

    pub fn finish_count(&self) -> usize {
        self.records.iter().filter(|r| r.termination == Termination::Finished).count()
    }
}

/// Keeps the most recent episode rewards for running statistics
pub struct RewardWindow {
    max_len: usize,
    buffer: VecDeque<f32>,
}

impl RewardWindow {
    pub fn new(max_len: usize) -> Self {
        assert!(max_len > 0);
        Self {
            max_len,
            buffer: VecDeque::with_capacity(max_len),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn add(&mut self, reward: f32) {
        if self.buffer.len() == self.max_len {
            self.buffer.pop_front();
        }
        self.buffer.push_back(reward);
    }

    pub fn avg(&self) -> f32 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.buffer.iter().sum::<f32>() / self.buffer.len() as f32
        }
    }

    pub fn max(&self) -> f32 {
        self.buffer.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}
