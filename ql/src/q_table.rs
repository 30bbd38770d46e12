use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{SteeringAction, ACTION_SPACE};
use crate::prelude::{QlError, Result};
use crate::state::{DiscreteState, STATE_SPACE};

/// File name of the table persisted at the end of a training session
pub const LAST_QTABLE_FILE: &str = "last_qtable.bin";
/// File name of the shipped baseline table
pub const DEFAULT_QTABLE_FILE: &str = "default_qtable.bin";

/// On-disk shape: state key -> (action degrees -> value)
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedQTable {
    states: BTreeMap<(u8, u8, u8), BTreeMap<i8, f32>>,
}

/// Dense `STATE_SPACE` x `ACTION_SPACE` table of action values.
/// Every state owns the full action set from the start (zero-initialized).
#[derive(Clone, PartialEq)]
pub struct QTable {
    values: Vec<f32>,
}

impl QTable {
    pub fn new() -> Self {
        Self {
            values: vec![0.0; STATE_SPACE * ACTION_SPACE],
        }
    }

    fn offset(state: DiscreteState) -> usize {
        state.index() * ACTION_SPACE
    }

    pub fn get(&self, state: DiscreteState, action: SteeringAction) -> f32 {
        self.values[Self::offset(state) + action.index()]
    }

    pub fn set(&mut self, state: DiscreteState, action: SteeringAction, value: f32) {
        self.values[Self::offset(state) + action.index()] = value;
    }

    /// Values of all actions for `state`, in action iteration order
    pub fn action_values(&self, state: DiscreteState) -> &[f32] {
        let offset = Self::offset(state);
        &self.values[offset..offset + ACTION_SPACE]
    }

    pub fn max_value(&self, state: DiscreteState) -> f32 {
        self.action_values(state)
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Action with the highest value. Ties go to the first one in iteration order.
    pub fn best_action(&self, state: DiscreteState) -> SteeringAction {
        let (best_index, _) = self
            .action_values(state)
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                if v > best_v { (i, v) } else { (best_i, best_v) }
            });
        SteeringAction::from_index(best_index).unwrap_or(SteeringAction(0))
    }

    /// Number of states with at least one non-zero action value
    pub fn visited_states(&self) -> usize {
        self.values
            .chunks(ACTION_SPACE)
            .filter(|row| row.iter().any(|&v| v != 0.0))
            .count()
    }

    fn to_persisted(&self) -> PersistedQTable {
        let states = DiscreteState::all()
            .map(|state| {
                let actions = SteeringAction::all()
                    .map(|action| (action.0, self.get(state, action)))
                    .collect();
                (state.key(), actions)
            })
            .collect();
        PersistedQTable { states }
    }

    fn from_persisted(path: &Path, persisted: PersistedQTable) -> Result<Self> {
        let mut table = QTable::new();
        let mut entries = 0_usize;
        for ((front, left, right), actions) in persisted.states {
            let state = DiscreteState::new(front, left, right)
                .ok_or_else(|| QlError::persistence(path, format!("invalid state key ({},{},{})", front, left, right)))?;
            if actions.len() != ACTION_SPACE {
                return Err(QlError::persistence(
                    path,
                    format!("state {} holds {} actions instead of {}", state, actions.len(), ACTION_SPACE),
                ));
            }
            for (degrees, value) in actions {
                let action = SteeringAction::try_from_degrees(degrees as i32)
                    .map_err(|e| QlError::persistence(path, e))?;
                if !value.is_finite() {
                    return Err(QlError::persistence(path, format!("non-finite value at {} {}", state, action)));
                }
                table.set(state, action, value);
                entries += 1;
            }
        }
        if entries != STATE_SPACE * ACTION_SPACE {
            return Err(QlError::persistence(
                path,
                format!("incomplete table: {} of {} entries", entries, STATE_SPACE * ACTION_SPACE),
            ));
        }
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(&self.to_persisted()).map_err(|e| QlError::persistence(path, e))?;
        fs::write(path, bytes).map_err(|e| QlError::persistence(path, e))?;
        log::debug!("Q-table saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| QlError::persistence(path, e))?;
        let persisted: PersistedQTable = bincode::deserialize(&bytes).map_err(|e| QlError::persistence(path, e))?;
        let table = Self::from_persisted(path, persisted)?;
        log::debug!("Q-table loaded from {} ({} visited states)", path.display(), table.visited_states());
        Ok(table)
    }
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for QTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QTable")
            .field("states", &STATE_SPACE)
            .field("actions", &ACTION_SPACE)
            .field("visited_states", &self.visited_states())
            .finish()
    }
}
