//! # checklist - recurring items for todo.txt
//!
//! Keeps a small JSON file of recurring "checklist" items next to a todo.txt
//! task list and, when run, makes sure each item has exactly one live task.
//!
//! ## Item types
//!
//! - **daily**: a new task every day; yesterday's task is settled first.
//! - **weekly**: a new task on a given weekday, with `complete_time` days to finish it.
//! - **monthly**: a new task on a given day of the month (clamped to short months).
//! - **floating**: a new task `wait` days after the previous one was finished.
//!
//! ## How a run works
//!
//! Tasks generated for an item carry a `checklist:<id>` tag. When the window
//! for finishing a task closes, `process` marks it `checklist:<id>_complete`
//! if it was done, or completes it and marks it `checklist:<id>_incomplete`
//! if it was not. A new task is only created after the old one is settled.
//!
//! ## Quick Start
//!
//! ```bash
//! checklist add "do time sheet +work" --type weekly --day fri --complete-time 2
//! checklist add "pay bills +finances @home" --type monthly --day 15 --complete-time 3
//! checklist ls
//!
//! # once a day, e.g. from cron
//! checklist process
//! ```
//!
//! The task directory comes from `TODO_DIR` in `~/.todo.cfg` (the todo.sh
//! config), or from `--todo-dir`.

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod checklist;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod reconcile;
pub mod task;

use cli::Cli;
use cmd::*;
use config::TodoConfig;
use db::ChecklistStore;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Completions need no task directory.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let config = match TodoConfig::resolve(&cli.config, cli.todo_dir.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let checklist_path = config.path_for(&cli.file);
    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());

    if let Commands::Process = cli.command {
        cmd_process(&config, &checklist_path, today);
        return;
    }

    let mut store = match ChecklistStore::load(&checklist_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to load checklist items: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Process => unreachable!("process handled above"),
        Commands::Completions { .. } => unreachable!("completions handled above"),

        Commands::Ls => cmd_ls(&store),

        Commands::Add { text, kind, id, day, complete_time, wait } => {
            let record = record_from_args(text, kind, id, day, complete_time, wait);
            cmd_add(&mut store, record)
        }

        Commands::Rm { index } => cmd_rm(&mut store, index),
    }
}
