use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Traces the rays of a JSON scene file, and writes the resulting segments as JSON.
#[derive(Parser)]
#[command(name = "run_scene_json")]
pub struct Args {
    /// Path to the scene file
    pub scene: PathBuf,

    /// Where to write the traced segments, standard output if not provided
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of rays to process, overrides the scene file's
    #[arg(long)]
    pub ray_budget: Option<usize>,

    /// Seed of the random generator, overrides the scene file's
    #[arg(long)]
    pub seed: Option<u64>,

    /// Length rays are extended to before being traced, overrides the scene file's
    #[arg(long)]
    pub extension_distance: Option<f64>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,

    #[arg(long, default_value = "info")]
    pub log_level: LogLevel,
}
