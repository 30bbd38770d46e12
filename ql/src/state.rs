use std::fmt::{Display, Formatter};


use crate::prelude::{QlError, Result};

/// Number of bins per sensor
pub const NUM_BINS: u8 = 4;
/// Number of distinct discrete states (4 x 4 x 4)
pub const STATE_SPACE: usize = (NUM_BINS as usize).pow(3);

pub const DEFAULT_SENSOR_BINS: [f32; 3] = [3.0, 7.0, 12.0];

/// Distances measured by the three range sensors, in track units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    pub front: f32,
    pub left: f32,
    pub right: f32,
}

impl SensorReading {
    pub fn new(front: f32, left: f32, right: f32) -> Self {
        Self { front, left, right }
    }

    pub fn min_side(&self) -> f32 {
        f32::min(self.left, self.right)
    }
}

impl Display for SensorReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "front: {:.2}, left: {:.2}, right: {:.2}", self.front, self.left, self.right)
    }
}

/// Binned sensor reading; the key of the Q-table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiscreteState {
    front: u8,
    left: u8,
    right: u8,
}

impl DiscreteState {
    pub fn new(front: u8, left: u8, right: u8) -> Option<Self> {
        if front < NUM_BINS && left < NUM_BINS && right < NUM_BINS {
            Some(Self { front, left, right })
        } else {
            None
        }
    }

    pub fn front(&self) -> u8 {
        self.front
    }

    pub fn left(&self) -> u8 {
        self.left
    }

    pub fn right(&self) -> u8 {
        self.right
    }

    pub fn key(&self) -> (u8, u8, u8) {
        (self.front, self.left, self.right)
    }

    /// Dense index in `0..STATE_SPACE`
    pub fn index(&self) -> usize {
        let n = NUM_BINS as usize;
        self.front as usize * n * n + self.left as usize * n + self.right as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index >= STATE_SPACE {
            return None;
        }
        let n = NUM_BINS as usize;
        Some(Self {
            front: (index / (n * n)) as u8,
            left: (index / n % n) as u8,
            right: (index % n) as u8,
        })
    }

    /// All states in index order
    pub fn all() -> impl Iterator<Item = DiscreteState> {
        (0..STATE_SPACE).filter_map(DiscreteState::from_index)
    }
}

impl Display for DiscreteState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.front, self.left, self.right)
    }
}

/// Ascending distance thresholds splitting a sensor distance into the bins
/// `[0,b0)`, `[b0,b1)`, `[b1,b2)`, `[b2,∞)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorBins([f32; 3]);

impl SensorBins {
    pub fn new(thresholds: [f32; 3]) -> Result<Self> {
        let valid = thresholds.iter().all(|t| t.is_finite() && *t >= 0.0)
            && thresholds.windows(2).all(|w| w[0] < w[1]);
        if valid {
            Ok(Self(thresholds))
        } else {
            Err(QlError::config(
                "sensor_bins",
                format!("{:?}", thresholds),
                "thresholds must be finite, non-negative and strictly ascending",
            ))
        }
    }

    pub fn thresholds(&self) -> [f32; 3] {
        self.0
    }

    /// NaN readings land in the highest bin.
    pub fn bin(&self, distance: f32) -> u8 {
        self.0
            .iter()
            .position(|&threshold| distance < threshold)
            .unwrap_or(self.0.len()) as u8
    }

    pub fn discretize(&self, reading: &SensorReading) -> DiscreteState {
        DiscreteState {
            front: self.bin(reading.front),
            left: self.bin(reading.left),
            right: self.bin(reading.right),
        }
    }
}

impl Default for SensorBins {
    fn default() -> Self {
        Self(DEFAULT_SENSOR_BINS)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, 0)]
    #[case(2.99, 0)]
    #[case(3.0, 1)]
    #[case(6.5, 1)]
    #[case(7.0, 2)]
    #[case(11.99, 2)]
    #[case(12.0, 3)]
    #[case(250.0, 3)]
    #[case(f32::NAN, 3)]
    fn test_bin_boundaries(#[case] distance: f32, #[case] expected: u8) {
        assert_eq!(SensorBins::default().bin(distance), expected);
    }

    #[test]
    fn test_discretize_is_monotonic() {
        let bins = SensorBins::default();
        let distances: Vec<f32> = (0..400).map(|i| i as f32 * 0.05).collect();
        for w in distances.windows(2) {
            let lower = bins.discretize(&SensorReading::new(w[0], w[0], w[0]));
            let upper = bins.discretize(&SensorReading::new(w[1], w[1], w[1]));
            assert!(lower.front() <= upper.front());
            assert!(lower.left() <= upper.left());
            assert!(lower.right() <= upper.right());
        }
    }

    #[test]
    fn test_discretize_bins_each_sensor_independently() {
        let state = SensorBins::default().discretize(&SensorReading::new(1.0, 8.0, 30.0));
        assert_eq!(state.key(), (0, 2, 3));
    }

    #[test]
    fn test_state_index_covers_all_keys() {
        let states: Vec<_> = DiscreteState::all().collect();
        assert_eq!(states.len(), STATE_SPACE);
        for (i, s) in states.iter().enumerate() {
            assert_eq!(s.index(), i);
            assert_eq!(DiscreteState::from_index(i), Some(*s));
        }
        assert_eq!(DiscreteState::from_index(STATE_SPACE), None);
        assert_eq!(DiscreteState::new(4, 0, 0), None);
    }

    #[rstest]
    #[case([7.0, 3.0, 12.0])]
    #[case([3.0, 3.0, 12.0])]
    #[case([-1.0, 3.0, 12.0])]
    #[case([3.0, 7.0, f32::INFINITY])]
    fn test_invalid_bins_are_rejected(#[case] thresholds: [f32; 3]) {
        match SensorBins::new(thresholds) {
            Err(QlError::ConfigValidation { field, .. }) => assert_eq!(field, "sensor_bins"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
