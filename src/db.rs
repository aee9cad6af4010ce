//! File storage for task lists and the checklist item document.
//!
//! Both stores read the whole file into memory and replace it wholesale on
//! save (temp file + rename). A missing file loads as an empty store.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::checklist::{ChecklistItem, ItemRecord};
use crate::error::{ChecklistError, Result};
use crate::task::Task;

/// A todo.txt style list of tasks backed by one file.
#[derive(Debug)]
pub struct TodoFile {
    pub path: PathBuf,
    pub tasks: Vec<Task>,
}

impl TodoFile {
    /// Load tasks from `path`. Blank lines are dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "task file not found, starting empty");
                String::new()
            }
            Err(source) => return Err(ChecklistError::Io { path: path.to_path_buf(), source }),
        };

        let mut tasks = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            match Task::parse(line.trim()) {
                Some(task) => tasks.push(task),
                None => debug!(path = %path.display(), line = lineno + 1, "skipping blank line"),
            }
        }
        Ok(TodoFile { path: path.to_path_buf(), tasks })
    }

    /// Render the list, one task per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for task in &self.tasks {
            out.push_str(&task.to_string());
            out.push('\n');
        }
        out
    }

    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, self.render().as_bytes())
    }
}

/// The JSON document listing every checklist item.
#[derive(Debug)]
pub struct ChecklistStore {
    pub path: PathBuf,
    pub items: Vec<ChecklistItem>,
    /// Set when loading had to invent ids; the caller should save to keep them.
    pub generated_ids: bool,
}

impl ChecklistStore {
    /// Load and validate the item document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "checklist file not found, no items defined");
                return Ok(ChecklistStore {
                    path: path.to_path_buf(),
                    items: Vec::new(),
                    generated_ids: false,
                });
            }
            Err(source) => return Err(ChecklistError::Io { path: path.to_path_buf(), source }),
        };
        Self::from_json(path, &contents)
    }

    /// Parse a document already read into memory.
    pub fn from_json(path: &Path, contents: &str) -> Result<Self> {
        let records: Vec<ItemRecord> = serde_json::from_str(contents)
            .map_err(|source| ChecklistError::Json { path: path.to_path_buf(), source })?;

        let mut store = ChecklistStore {
            path: path.to_path_buf(),
            items: Vec::with_capacity(records.len()),
            generated_ids: false,
        };
        // Explicit ids claim their names before any are generated.
        let mut taken: HashSet<String> = records.iter().filter_map(|r| r.id.clone()).collect();
        for mut record in records {
            if record.id.is_none() {
                let id = unique_id(&record.text, &taken);
                debug!(id = %id, text = %record.text, "generated checklist item id");
                taken.insert(id.clone());
                record.id = Some(id);
                store.generated_ids = true;
            }
            store.push(ChecklistItem::try_from(record)?)?;
        }
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String> {
        let records: Vec<ItemRecord> = self.items.iter().map(ChecklistItem::to_record).collect();
        serde_json::to_string_pretty(&records)
            .map_err(|source| ChecklistError::Json { path: self.path.clone(), source })
    }

    pub fn save(&self) -> Result<()> {
        let mut data = self.to_json()?;
        data.push('\n');
        write_atomic(&self.path, data.as_bytes())
    }

    /// Append an item, rejecting duplicate ids.
    pub fn push(&mut self, item: ChecklistItem) -> Result<()> {
        if self.get(&item.id).is_some() {
            return Err(ChecklistError::DuplicateId(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Add an item from a raw record, generating an id if it has none.
    pub fn add(&mut self, mut record: ItemRecord) -> Result<&ChecklistItem> {
        if record.id.is_none() {
            let taken: HashSet<String> = self.items.iter().map(|i| i.id.clone()).collect();
            record.id = Some(unique_id(&record.text, &taken));
        }
        self.push(ChecklistItem::try_from(record)?)?;
        Ok(&self.items[self.items.len() - 1])
    }

    /// Remove the item at a 1-based position.
    pub fn remove(&mut self, index: usize) -> Result<ChecklistItem> {
        let count = self.items.len();
        if index == 0 || index > count {
            return Err(ChecklistError::IndexOutOfRange { index, count });
        }
        Ok(self.items.remove(index - 1))
    }

    pub fn get(&self, id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Turn free text into an id: lower case alphanumerics joined by `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_lowercase());
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// Slug of `text`, suffixed with `-2`, `-3`, ... until it is not in `taken`.
fn unique_id(text: &str, taken: &HashSet<String>) -> String {
    let base = slugify(text);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

/// Write via a sibling temp file and rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let io_err = |source| ChecklistError::Io { path: path.to_path_buf(), source };
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let written = File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(data)?;
            f.flush()
        })
        .and_then(|()| fs::rename(&tmp, path));
    if let Err(source) = written {
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %tmp.display(), error = %e, "could not remove temp file");
            }
        }
        return Err(io_err(source));
    }
    Ok(())
}
