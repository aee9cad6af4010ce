//! Error type shared by the task parser, the schedule engine and the stores.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong while loading, reconciling or saving.
#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checklist document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown checklist item type '{0}' (expected daily, weekly, monthly or floating)")]
    UnknownType(String),

    #[error("checklist item is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("checklist item id '{0}' is used more than once")]
    DuplicateId(String),

    #[error("checklist item id '{0}' must not be empty or contain whitespace or '_'")]
    InvalidId(String),

    #[error("bad priority '{0}': expected a single letter A-Z or (A)-(Z)")]
    InvalidPriority(String),

    #[error("task for checklist item '{id}' has no creation date: {line}")]
    MissingCreateDate { id: String, line: String },

    #[error("task for checklist item '{0}' has no completion date")]
    MissingFinishDate(String),

    #[error("date arithmetic on {0} left the supported calendar range")]
    DateOutOfRange(NaiveDate),

    #[error("could not resolve todo configuration: {0}")]
    Config(String),

    #[error("no checklist item at index {index} ({count} defined)")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ChecklistError>;
