//! Placeholder variable table and its `key=value` file format.
//!
//! ## File Format
//!
//! ```text
//! [TITLE]=My Book
//! [AUTHOR]=Jane Doe
//! [EQUATION]=a=b
//! ```
//!
//! One pair per line, split on the first `=`. Everything after it (including
//! further `=` characters) is the value. There is no escaping and no comment
//! syntax. Blank lines are skipped; any other line without `=` is rejected.
//!
//! ## Ordering
//!
//! [`VariableTable`] keeps insertion order, which is also the order in which
//! keys take priority during substitution. Re-inserting a key replaces its
//! value but keeps its original position.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum VariablesError {
    #[error("Cannot read variables file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed variable line {line} (expected key=value): {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("Empty variable key on line {0}")]
    EmptyKey(usize),
}

/// Ordered mapping from placeholder token to replacement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&pos| self.entries[pos].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Parse the contents of a variables file.
pub fn parse_variables(content: &str) -> Result<VariableTable, VariablesError> {
    let mut table = VariableTable::new();
    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| VariablesError::MalformedLine {
                line: line_no,
                content: line.to_string(),
            })?;
        if key.is_empty() {
            return Err(VariablesError::EmptyKey(line_no));
        }
        info!(op = "prepare_variables", key, value);
        table.insert(key, value);
    }
    Ok(table)
}

/// Read and parse a variables file.
pub fn load_variables(path: &Path) -> Result<VariableTable, VariablesError> {
    let content = fs::read_to_string(path).map_err(|source| VariablesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_variables(&content)?;
    info!(op = "prepare_variables", path = %path.display(), count = table.len());
    Ok(table)
}
