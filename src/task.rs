//! Task record and the todo.txt line format.
//!
//! A task is one line of text. Recognised tokens are pulled out into structured
//! fields; everything else becomes the free-text body. Rendering always emits
//! tokens in a fixed order, so a parse/render cycle normalises a line.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::error::{ChecklistError, Result};
use crate::fields::{ChecklistTag, CHECKLIST_TAG};

/// Date format used by todo.txt for creation and completion dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A todo.txt priority letter, always upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority(char);

impl Priority {
    /// Accept `A`, `a`, `(A)` or `(a)`. Anything else is rejected.
    pub fn parse(value: &str) -> Result<Self> {
        let upper = value.trim().to_uppercase();
        let letter = upper
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(&upper);
        let mut chars = letter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Ok(Priority(c)),
            _ => Err(ChecklistError::InvalidPriority(value.to_string())),
        }
    }

    /// Recognise a priority token inside a task line. Only the canonical
    /// `(A)` form counts here; lower case or bare letters are body text.
    fn from_token(word: &str) -> Option<Self> {
        let inner = word.strip_prefix('(')?.strip_suffix(')')?;
        let mut chars = inner.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => Some(Priority(c)),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0)
    }
}

/// A single todo.txt task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Task {
    pub priority: Option<Priority>,
    pub create: Option<NaiveDate>,
    pub finish: Option<NaiveDate>,
    pub done: bool,
    /// Free-text body with project, context and tag tokens removed.
    pub text: String,
    pub projects: Vec<String>,
    pub contexts: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

impl Task {
    /// Create an open task with the given body and no dates.
    pub fn new(text: impl Into<String>) -> Self {
        Task {
            text: text.into(),
            ..Task::default()
        }
    }

    /// Create an open task stamped with a creation date.
    pub fn created_on(text: impl Into<String>, today: NaiveDate) -> Self {
        Task {
            create: Some(today),
            ..Task::new(text)
        }
    }

    /// Set or clear the priority. An empty value clears it.
    pub fn set_priority(&mut self, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            self.priority = None;
        } else {
            self.priority = Some(Priority::parse(value)?);
        }
        Ok(())
    }

    /// Mark the task done, stamping the completion date.
    pub fn complete_on(&mut self, today: NaiveDate) {
        self.done = true;
        self.finish = Some(today);
    }

    /// Mark the task open again and clear the completion date.
    pub fn reopen(&mut self) {
        self.done = false;
        self.finish = None;
    }

    /// The structured `checklist:` tag, if the task carries one.
    pub fn checklist_tag(&self) -> Option<ChecklistTag> {
        self.tags.get(CHECKLIST_TAG).map(|raw| ChecklistTag::parse(raw))
    }

    pub fn set_checklist_tag(&mut self, tag: &ChecklistTag) {
        self.tags.insert(CHECKLIST_TAG.to_string(), tag.to_string());
    }

    /// Parse one line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Task> {
        let mut tokens = line.split_whitespace().peekable();
        tokens.peek()?;

        let mut task = Task::default();
        if tokens.next_if_eq(&"x").is_some() {
            task.done = true;
            if let Some(date) = tokens.peek().and_then(|w| parse_date(w)) {
                task.finish = Some(date);
                tokens.next();
            }
        }
        if let Some(priority) = tokens.peek().and_then(|w| Priority::from_token(w)) {
            task.priority = Some(priority);
            tokens.next();
        }
        if let Some(date) = tokens.peek().and_then(|w| parse_date(w)) {
            task.create = Some(date);
            tokens.next();
        }

        let mut bare_words = Vec::new();
        for word in tokens {
            if word.starts_with('+') {
                task.projects.push(word.to_string());
            } else if word.starts_with('@') {
                task.contexts.push(word.to_string());
            } else if let Some((key, value)) = split_tag(word) {
                task.tags.insert(key.to_string(), value.to_string());
            } else {
                bare_words.push(word);
            }
        }
        task.text = bare_words.join(" ");
        Some(task)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<String> = Vec::new();
        if self.done {
            // todo.sh drops the priority when a task is marked done.
            tokens.push("x".to_string());
            tokens.extend(self.finish.map(|d| d.format(DATE_FORMAT).to_string()));
        } else {
            tokens.extend(self.priority.map(|p| p.to_string()));
        }
        tokens.extend(self.create.map(|d| d.format(DATE_FORMAT).to_string()));
        tokens.push(self.text.clone());
        tokens.extend(self.projects.iter().cloned());
        tokens.extend(self.contexts.iter().cloned());
        tokens.extend(self.tags.iter().map(|(k, v)| format!("{k}:{v}")));

        let line = tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&line)
    }
}

/// Parse a `YYYY-MM-DD` token. Unpadded months and days are accepted.
pub fn parse_date(word: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(word, DATE_FORMAT).ok()
}

/// A `key:value` token needs at least one character either side of a colon.
fn split_tag(word: &str) -> Option<(&str, &str)> {
    let (key, value) = word.split_once(':')?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
