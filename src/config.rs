use std::{env, path::PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
}

#[derive(Debug, Parser)]
#[command(version, about = "Todo list and course calendar in the terminal")]
pub struct Cli {
    /// SQLite file holding the todo list
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// JSON export of upcoming assignments
    #[arg(long)]
    pub assignments: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the todo list
    List,
    /// Add a todo
    Add { text: String },
    /// Flip a todo's completion flag
    Toggle { index: usize },
    /// Remove a todo
    Delete { index: usize },
    /// Print a month's events day by day
    Month {
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i32,
    },
    /// Print assignments due from now on
    Upcoming {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub assignments_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let data_dir = match (&cli.db, &cli.assignments, &cli.log_dir) {
            (Some(_), Some(_), Some(_)) => PathBuf::new(),
            _ => data_dir()?,
        };
        Ok(Config {
            db_path: cli
                .db
                .clone()
                .unwrap_or_else(|| data_dir.join("canvas-plus.sqlite")),
            assignments_path: cli
                .assignments
                .clone()
                .unwrap_or_else(|| data_dir.join("assignments.json")),
            log_level: cli.log_level.clone(),
            log_dir: cli.log_dir.clone().unwrap_or_else(|| data_dir.join("logs")),
        })
    }
}

fn data_dir() -> Result<PathBuf, ConfigError> {
    let home_dir: PathBuf = match env::var_os("HOME") {
        Some(home) => home.into(),
        None => return Err(ConfigError::NoHomeDir),
    };
    Ok(home_dir.join(".canvas-plus"))
}
