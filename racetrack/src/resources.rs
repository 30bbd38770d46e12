use std::path::PathBuf;

use ql::q_table::DEFAULT_QTABLE_FILE;

pub const TRACK_FILE: &str = "track.txt";

/// Files shipped with the crate: the classic track and a baseline Q-table trained on it
pub fn resource_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

pub fn classic_track_file() -> PathBuf {
    resource_dir().join(TRACK_FILE)
}

pub fn baseline_table_file() -> PathBuf {
    resource_dir().join(DEFAULT_QTABLE_FILE)
}
