use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ql::q_table::LAST_QTABLE_FILE;
use ql::state::DEFAULT_SENSOR_BINS;
use ql::util::init_logging;
use racetrack::learn::evaluator::{Evaluator, DEFAULT_EVALUATION_MAX_STEPS};
use racetrack::learn::trainer::{SessionOutcome, Trainer, TrainingConfig};
use racetrack::resources::{baseline_table_file, classic_track_file};
use racetrack::track::TrackGeometry;
use racetrack::vehicle::VehicleParameter;

/// Self-driving car on a 2D race track, learned with tabular Q-learning
#[derive(Parser, Debug)]
#[command(name = "racetrack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a Q-table and save the committed table
    Train {
        /// Track definition file; defaults to the classic track
        #[arg(long)]
        track: Option<PathBuf>,
        #[arg(long, default_value_t = 300)]
        episodes: usize,
        #[arg(long, default_value_t = 0.05)]
        learning_rate: f32,
        #[arg(long, default_value_t = 0.8)]
        discount_factor: f32,
        /// Initial exploration rate
        #[arg(long, default_value_t = 1.0)]
        epsilon: f64,
        /// Exploration decay on a new best episode; defaults to the discount factor
        #[arg(long)]
        exploration_decay: Option<f64>,
        /// Step cap per episode
        #[arg(long)]
        max_steps: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Three ascending distance thresholds, e.g. `3,7,12`
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SENSOR_BINS)]
        sensor_bins: Vec<f32>,
        #[arg(long, default_value = LAST_QTABLE_FILE)]
        out: PathBuf,
    },
    /// Drive the track greedily with a trained Q-table
    Evaluate {
        /// Track definition file; defaults to the classic track
        #[arg(long)]
        track: Option<PathBuf>,
        /// Q-table file; defaults to the table of the last training session
        #[arg(long)]
        table: Option<PathBuf>,
        /// Evaluate the baseline table shipped with the crate instead
        #[arg(long, conflicts_with = "table")]
        baseline: bool,
        /// Must match the thresholds the table was trained with
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_SENSOR_BINS)]
        sensor_bins: Vec<f32>,
        #[arg(long, default_value_t = DEFAULT_EVALUATION_MAX_STEPS)]
        max_steps: usize,
    },
}

fn load_track(path: Option<PathBuf>) -> anyhow::Result<Arc<TrackGeometry>> {
    let path = path.unwrap_or_else(classic_track_file);
    let track = TrackGeometry::load(&path).with_context(|| format!("loading track {}", path.display()))?;
    Ok(Arc::new(track))
}

fn sensor_bins(values: &[f32]) -> anyhow::Result<[f32; 3]> {
    match <[f32; 3]>::try_from(values) {
        Ok(bins) => Ok(bins),
        Err(_) => bail!("--sensor-bins takes exactly 3 thresholds, got {}", values.len()),
    }
}

fn evaluation_table(table: Option<PathBuf>, baseline: bool) -> PathBuf {
    match table {
        Some(path) => path,
        None if baseline => baseline_table_file(),
        None => Path::new(LAST_QTABLE_FILE).to_path_buf(),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            track,
            episodes,
            learning_rate,
            discount_factor,
            epsilon,
            exploration_decay,
            max_steps,
            seed,
            sensor_bins: bins,
            out,
        } => {
            let config = TrainingConfig {
                learning_rate,
                discount_factor,
                exploration_rate: epsilon,
                exploration_decay: exploration_decay.unwrap_or(discount_factor as f64),
                episode_count: episodes,
                max_steps_per_episode: max_steps,
                sensor_bins: sensor_bins(&bins)?,
                seed,
                vehicle: VehicleParameter::default(),
                save_path: Some(out),
            };
            let mut trainer = Trainer::new(load_track(track)?, config)?;
            match trainer.run()? {
                SessionOutcome::Completed => {
                    let session = trainer.session();
                    println!(
                        "{} episodes, {} finished, best reward {:.1}",
                        session.episode_count(),
                        session.finish_count(),
                        session.best_reward
                    );
                }
                SessionOutcome::Cancelled => println!("training cancelled"),
            }
        }
        Command::Evaluate {
            track,
            table,
            baseline,
            sensor_bins: bins,
            max_steps,
        } => {
            let table = evaluation_table(table, baseline);
            let mut evaluator = Evaluator::new(load_track(track)?, VehicleParameter::default())?
                .with_sensor_bins(sensor_bins(&bins)?)
                .with_max_steps(Some(max_steps));
            let report = evaluator
                .run_table_file(&table)
                .with_context(|| format!("evaluating {}", table.display()))?;
            println!("{} after {} steps", report.termination, report.steps);
            for pose in &report.path {
                println!("{:.2},{:.2},{:.1}", pose.x, pose.y, pose.heading);
            }
        }
    }
    Ok(())
}
