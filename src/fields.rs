//! Small value types shared by the engine and the command layer.
//!
//! The `checklist:` tag on a task links it to the checklist item that created
//! it. On disk it is a plain string (`<id>` or `<id>_<status>`); in memory it
//! is a [`ChecklistTag`] so nothing downstream has to split strings.

use std::fmt;

use chrono::Weekday;
use clap::ValueEnum;

use crate::error::{ChecklistError, Result};

/// Tag key linking a task to its checklist item.
pub const CHECKLIST_TAG: &str = "checklist";

/// Reconciliation state encoded in the tag suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistStatus {
    /// No suffix yet: the task is live.
    Pending,
    Complete,
    Incomplete,
    /// A suffix this tool did not write. Preserved as-is.
    Other(String),
}

impl ChecklistStatus {
    fn from_suffix(suffix: &str) -> Self {
        match suffix {
            "" => ChecklistStatus::Pending,
            "complete" => ChecklistStatus::Complete,
            "incomplete" => ChecklistStatus::Incomplete,
            other => ChecklistStatus::Other(other.to_string()),
        }
    }

    fn suffix(&self) -> &str {
        match self {
            ChecklistStatus::Pending => "",
            ChecklistStatus::Complete => "complete",
            ChecklistStatus::Incomplete => "incomplete",
            ChecklistStatus::Other(s) => s,
        }
    }

    /// True for the two suffixes written by reconciliation.
    pub fn is_final(&self) -> bool {
        matches!(self, ChecklistStatus::Complete | ChecklistStatus::Incomplete)
    }
}

/// Structured form of the `checklist:` tag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistTag {
    pub id: String,
    pub status: ChecklistStatus,
}

impl ChecklistTag {
    pub fn pending(id: impl Into<String>) -> Self {
        ChecklistTag { id: id.into(), status: ChecklistStatus::Pending }
    }

    pub fn with_status(&self, status: ChecklistStatus) -> Self {
        ChecklistTag { id: self.id.clone(), status }
    }

    /// Split on the first `_`: the left part is the item id, the rest the status.
    pub fn parse(raw: &str) -> Self {
        let (id, suffix) = raw.split_once('_').unwrap_or((raw, ""));
        ChecklistTag {
            id: id.to_string(),
            status: ChecklistStatus::from_suffix(suffix),
        }
    }
}

impl fmt::Display for ChecklistTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status.suffix() {
            "" => write!(f, "{}", self.id),
            suffix => write!(f, "{}_{}", self.id, suffix),
        }
    }
}

/// Checklist item types, as named in the JSON document and on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ScheduleKind {
    Daily,
    Weekly,
    Monthly,
    Floating,
}

impl ScheduleKind {
    /// Case-insensitive lookup of a `type` value.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ScheduleKind::Daily),
            "weekly" => Ok(ScheduleKind::Weekly),
            "monthly" => Ok(ScheduleKind::Monthly),
            "floating" => Ok(ScheduleKind::Floating),
            _ => Err(ChecklistError::UnknownType(s.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScheduleKind::Daily => "daily",
            ScheduleKind::Weekly => "weekly",
            ScheduleKind::Monthly => "monthly",
            ScheduleKind::Floating => "floating",
        }
    }
}

/// Parse a day of the week: `0`..`6` (Monday first) or a name such as `sun` / `Sunday`.
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return weekday_from_index(n);
    }
    s.parse::<Weekday>().map_err(|_| ChecklistError::InvalidField {
        field: "day",
        value: s.to_string(),
        reason: "expected 0-6 or a weekday name",
    })
}

/// Map `0` = Monday .. `6` = Sunday to a weekday.
pub fn weekday_from_index(n: i64) -> Result<Weekday> {
    u8::try_from(n)
        .ok()
        .and_then(|n| Weekday::try_from(n).ok())
        .ok_or_else(|| ChecklistError::InvalidField {
            field: "day",
            value: n.to_string(),
            reason: "weekday index must be 0 (Monday) to 6 (Sunday)",
        })
}

/// Lower-case three letter abbreviation, as written back to the JSON document.
pub fn weekday_abbr(day: Weekday) -> String {
    day.to_string().to_lowercase()
}
