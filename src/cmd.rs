//! Command implementations for the CLI interface.
//!
//! `process` is the daily run; `ls`, `add` and `rm` edit the checklist item
//! document. Handlers report failures on stderr and exit with status 1.

use std::path::Path;

use chrono::NaiveDate;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::{info, warn};

use crate::checklist::{FieldValue, ItemRecord};
use crate::config::TodoConfig;
use crate::db::{ChecklistStore, TodoFile};
use crate::error::Result;
use crate::fields::ScheduleKind;
use crate::reconcile::process_all;

#[derive(Subcommand)]
pub enum Commands {
    /// Settle finished or expired checklist tasks and create the ones due today.
    Process,

    /// List checklist items.
    Ls,

    /// Add a checklist item.
    Add {
        /// Text for generated tasks. May include +project, @context and key:value tokens.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Item type.
        #[arg(long = "type", value_enum, default_value_t = ScheduleKind::Daily)]
        kind: ScheduleKind,
        /// Stable id. Generated from the text when omitted.
        #[arg(long)]
        id: Option<String>,
        /// Weekly: 0-6 (Monday first) or a day name. Monthly: day of the month.
        #[arg(long)]
        day: Option<String>,
        /// Days allowed to finish each task.
        #[arg(long)]
        complete_time: Option<u32>,
        /// Floating: days to wait after completion before the next task.
        #[arg(long)]
        wait: Option<u32>,
    },

    /// Remove a checklist item by its position in `ls`.
    Rm {
        /// 1-based index as shown by `ls`.
        index: usize,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run the reconciliation over both task lists and write them back.
/// Returns the number of tasks created.
pub fn run_process(config: &TodoConfig, checklist_path: &Path, today: NaiveDate) -> Result<usize> {
    let store = ChecklistStore::load(checklist_path)?;
    let mut todo = TodoFile::load(&config.todo_file)?;
    let mut done = TodoFile::load(&config.done_file)?;

    // One combined history; the split point puts every task back in its file.
    let split = todo.tasks.len();
    let mut all = std::mem::take(&mut todo.tasks);
    all.append(&mut done.tasks);
    let new_tasks = process_all(&mut all, &store.items, today)?;
    done.tasks = all.split_off(split);
    todo.tasks = all;

    let created = new_tasks.len();
    todo.tasks.extend(new_tasks);

    // Not atomic as a pair: a crash between the two writes leaves them out of step.
    todo.save()?;
    done.save()?;
    if store.generated_ids {
        info!(path = %store.path.display(), "saving generated checklist item ids");
        store.save()?;
    }
    Ok(created)
}

/// Process checklist items for `today`.
pub fn cmd_process(config: &TodoConfig, checklist_path: &Path, today: NaiveDate) {
    match run_process(config, checklist_path, today) {
        Ok(0) => println!("No new checklist tasks."),
        Ok(n) => println!("Added {} checklist task{}.", n, if n == 1 { "" } else { "s" }),
        Err(e) => {
            eprintln!("Processing failed, nothing written: {e}");
            std::process::exit(1);
        }
    }
}

/// Print checklist items in a table.
pub fn cmd_ls(store: &ChecklistStore) {
    if store.items.is_empty() {
        println!("No checklist items in {}.", store.path.display());
        return;
    }
    println!("{:<4} {:<16} {:<9} {:<40} {}", "#", "Id", "Type", "Schedule", "Text");
    for (i, item) in store.items.iter().enumerate() {
        println!(
            "{:<4} {:<16} {:<9} {:<40} {}",
            i + 1,
            truncate(&item.id, 16),
            item.kind().name(),
            truncate(&item.describe(), 40),
            item.text
        );
    }
}

/// Build a raw record from command line flags. Validation happens on insert.
pub fn record_from_args(
    text: Vec<String>,
    kind: ScheduleKind,
    id: Option<String>,
    day: Option<String>,
    complete_time: Option<u32>,
    wait: Option<u32>,
) -> ItemRecord {
    if day.is_some() && !matches!(kind, ScheduleKind::Weekly | ScheduleKind::Monthly) {
        warn!("--day only applies to weekly and monthly items, ignoring it");
    }
    if wait.is_some() && kind != ScheduleKind::Floating {
        warn!("--wait only applies to floating items, ignoring it");
    }
    if complete_time.is_some() && kind == ScheduleKind::Daily {
        warn!("--complete-time does not apply to daily items, ignoring it");
    }
    ItemRecord {
        kind: Some(kind.name().to_string()),
        id,
        text: text.join(" "),
        day: day.map(FieldValue::Text),
        complete_time: complete_time.map(|n| FieldValue::Number(i64::from(n))),
        wait: wait.map(|n| FieldValue::Number(i64::from(n))),
    }
}

/// Add a checklist item and save the document.
pub fn cmd_add(store: &mut ChecklistStore, record: ItemRecord) {
    let (id, summary) = match store.add(record) {
        Ok(item) => (item.id.clone(), item.describe()),
        Err(e) => {
            eprintln!("Failed to add checklist item: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.save() {
        eprintln!("Failed to save checklist items: {e}");
        std::process::exit(1);
    }
    println!("Added checklist item {id} ({summary})");
}

/// Remove a checklist item by 1-based index and save the document.
pub fn cmd_rm(store: &mut ChecklistStore, index: usize) {
    let removed = match store.remove(index) {
        Ok(item) => item,
        Err(e) => {
            eprintln!("Failed to remove checklist item: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.save() {
        eprintln!("Failed to save checklist items: {e}");
        std::process::exit(1);
    }
    println!("Removed checklist item {}", removed.id);
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
