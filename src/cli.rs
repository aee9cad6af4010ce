use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::cmd::Commands;
use crate::config::DEFAULT_CONFIG;

/// Recurring checklist items for todo.txt.
/// Items live in a JSON file next to todo.txt; `process` is meant to run once a day.
#[derive(Parser)]
#[command(name = "checklist", version, about = "Recurring checklist items for todo.txt")]
pub struct Cli {
    /// todo.sh config file used to locate the task lists.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Checklist item file, relative to the task directory unless absolute.
    #[arg(short, long, global = true, default_value = "checklist.json")]
    pub file: PathBuf,

    /// Task directory. Skips the config file when given.
    #[arg(long, global = true)]
    pub todo_dir: Option<PathBuf>,

    /// Process as of this date (YYYY-MM-DD) instead of today.
    #[arg(short, long, global = true)]
    pub date: Option<NaiveDate>,

    /// Log what each item does to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
