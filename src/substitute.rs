//! Global placeholder substitution across the working tree.
//!
//! Every regular file whose name ends in `.xml` is read whole, has every key
//! of the [`VariableTable`] replaced by its value, and is written back in
//! place. Other files are never opened. This is plain text substitution, not
//! XML-aware: a token inside a comment or attribute is replaced like any
//! other.
//!
//! ## Single Pass
//!
//! All keys are matched in one left-to-right scan. Text produced by a
//! replacement is never scanned again, so a value that happens to contain
//! another key is emitted verbatim and running the pass twice over its own
//! output only changes tokens that were literally present. When two keys
//! match at the same position, the one inserted into the table first wins.

use crate::variables::VariableTable;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SubstituteError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Cannot build placeholder matcher: {0}")]
    Pattern(#[from] regex::Error),
}

/// A compiled matcher for every key of a table.
pub struct Substituter<'a> {
    table: &'a VariableTable,
    pattern: Option<Regex>,
}

impl<'a> Substituter<'a> {
    pub fn new(table: &'a VariableTable) -> Result<Self, SubstituteError> {
        // Keys are escaped and joined in table order; regex alternation is
        // leftmost-first, which gives earlier keys priority on ties.
        let alternation: Vec<String> = table
            .keys()
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        let pattern = if alternation.is_empty() {
            None
        } else {
            Some(Regex::new(&alternation.join("|"))?)
        };
        Ok(Self { table, pattern })
    }

    /// Replace every key occurrence in `text`.
    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(re) => re
                .replace_all(text, |caps: &regex::Captures<'_>| {
                    self.table.get(&caps[0]).unwrap_or(&caps[0]).to_string()
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

/// Substitute variables in a single text.
pub fn substitute_text(text: &str, table: &VariableTable) -> Result<String, SubstituteError> {
    Ok(Substituter::new(table)?.apply(text))
}

fn is_xml(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(".xml"))
        .unwrap_or(false)
}

/// Rewrite one file in place.
pub fn substitute_file(path: &Path, substituter: &Substituter<'_>) -> Result<(), SubstituteError> {
    let io_err = |source: std::io::Error| SubstituteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = fs::read_to_string(path).map_err(io_err)?;
    let replaced = substituter.apply(&content);
    fs::write(path, replaced).map_err(io_err)?;
    Ok(())
}

/// Walk `dir` depth-first and substitute every `.xml` file.
///
/// Returns the files that were rewritten, in visit order.
pub fn replace_all_variables(
    dir: &Path,
    table: &VariableTable,
) -> Result<Vec<PathBuf>, SubstituteError> {
    let substituter = Substituter::new(table)?;
    let mut rewritten = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_xml(entry.path()) {
            continue;
        }
        info!(op = "replace_variables_in_file", file = %entry.path().display());
        substitute_file(entry.path(), &substituter)?;
        rewritten.push(entry.into_path());
    }

    info!(
        op = "replace_all_variables",
        dir = %dir.display(),
        files = rewritten.len(),
        variables = table.len()
    );
    Ok(rewritten)
}
