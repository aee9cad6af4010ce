//! Reconciliation of checklist items against their task history.
//!
//! For each item the latest generated task is settled first (marked
//! `_complete` or `_incomplete` once its window has closed), and only then is
//! a new task considered. An item therefore never has two live tasks.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::checklist::ChecklistItem;
use crate::error::Result;
use crate::fields::{ChecklistStatus, ChecklistTag};
use crate::task::Task;

/// True when a task is done and carries a `_complete` or `_incomplete` suffix.
///
/// Freshly created tasks and tasks finished by hand (no suffix yet) are not
/// reconciled.
pub fn is_reconciled(task: &Task) -> bool {
    task.done && task.checklist_tag().is_some_and(|tag| tag.status.is_final())
}

/// Settle `latest` if its window has closed and decide whether `item` needs a
/// new task today.
///
/// `latest` is updated in place. The returned task, if any, still has to be
/// added to the active list by the caller.
pub fn process(item: &ChecklistItem, latest: Option<&mut Task>, today: NaiveDate) -> Result<Option<Task>> {
    let candidate = item.new_task(today);

    let Some(latest) = latest else {
        info!(item = %item.id, "no history, creating first task");
        return Ok(Some(candidate));
    };

    if !is_reconciled(latest) {
        if !item.past_due(latest, today)? {
            debug!(item = %item.id, "latest task still within its window");
            return Ok(None);
        }

        let current = latest
            .checklist_tag()
            .map(|tag| tag.status)
            .unwrap_or(ChecklistStatus::Pending);
        let tag = ChecklistTag::pending(item.id.as_str());
        if latest.done {
            // A suffix written by someone else is left alone.
            if current == ChecklistStatus::Pending {
                latest.set_checklist_tag(&tag.with_status(ChecklistStatus::Complete));
                info!(item = %item.id, "marked complete");
            }
        } else {
            latest.complete_on(today);
            latest.set_checklist_tag(&tag.with_status(ChecklistStatus::Incomplete));
            info!(item = %item.id, "window closed, marked incomplete");
        }
    }

    if item.schedule_next(latest, today)? {
        info!(item = %item.id, "scheduling next task");
        Ok(Some(candidate))
    } else {
        Ok(None)
    }
}

/// Run every item against the full task history (active and archived).
///
/// Tasks are grouped by the id in their `checklist:` tag; tags naming an
/// unknown item are ignored. The latest task of a group is the one with the
/// greatest creation date, later input winning ties. Existing tasks are
/// mutated in place; the new tasks are returned in item order.
pub fn process_all(tasks: &mut [Task], items: &[ChecklistItem], today: NaiveDate) -> Result<Vec<Task>> {
    let mut groups: HashMap<&str, Vec<usize>> =
        items.iter().map(|item| (item.id.as_str(), Vec::new())).collect();

    for (idx, task) in tasks.iter().enumerate() {
        let Some(tag) = task.checklist_tag() else {
            continue;
        };
        match groups.get_mut(tag.id.as_str()) {
            Some(group) => group.push(idx),
            None => debug!(id = %tag.id, "ignoring task for unknown checklist item"),
        }
    }

    let mut new_tasks = Vec::new();
    for item in items {
        let latest = groups
            .get(item.id.as_str())
            .and_then(|group| group.iter().copied().max_by_key(|&idx| tasks[idx].create));
        if let Some(task) = process(item, latest.map(|idx| &mut tasks[idx]), today)? {
            new_tasks.push(task);
        }
    }
    Ok(new_tasks)
}
