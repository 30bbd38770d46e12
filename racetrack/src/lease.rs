use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::RaceTrackError;

/// Exclusive claim on a Q-table file for the duration of a training or evaluation run.
///
/// Backed by a `<table>.lock` file next to the table, created on acquisition and removed on drop.
#[derive(Debug)]
pub struct TableLease {
    table_path: PathBuf,
    lock_path: PathBuf,
}

impl TableLease {
    pub fn acquire(table_path: &Path) -> Result<Self, RaceTrackError> {
        let lock_path = lock_path(table_path);
        let mut lock_file = match OpenOptions::new().write(true).create_new(true).open(&lock_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(RaceTrackError::TableBusy(table_path.to_path_buf()));
            }
            Err(source) => return Err(RaceTrackError::Io { path: lock_path, source }),
        };
        if let Err(e) = writeln!(lock_file, "{}", std::process::id()) {
            log::warn!("could not write owner into {}: {}", lock_path.display(), e);
        }
        log::debug!("acquired lease on {}", table_path.display());
        Ok(Self {
            table_path: table_path.to_path_buf(),
            lock_path,
        })
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }
}

impl Drop for TableLease {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            log::warn!("could not release lease {}: {}", self.lock_path.display(), e);
        }
    }
}

fn lock_path(table_path: &Path) -> PathBuf {
    let mut name: OsString = table_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
