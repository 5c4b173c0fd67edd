//! Shared test utilities for the idml-gen test suite.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = setup_fixtures();
//! let template = fx.template_file();   // <tmp>/book.idml
//! let photos = fx.photo_dir();         // <tmp>/photos (a.jpg, b.jpg, c.jpg)
//! ```
//!
//! The fixture book uses `A` as its content spread name and ships a
//! `book.idml_variables.txt` with `[TITLE]` and `[AUTHOR]`.

use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

use crate::workdir::copy_dir_recursive;

// =========================================================================
// Fixture setup
// =========================================================================

pub struct Fixture {
    pub tmp: TempDir,
}

impl Fixture {
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Template file path. Only its name matters unless a test zips the
    /// template dir into it.
    pub fn template_file(&self) -> PathBuf {
        self.root().join("book.idml")
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.root().join("photos")
    }
}

/// Copy `fixtures/book/` to a temp directory and return it.
pub fn setup_fixtures() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/book");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    Fixture { tmp }
}

// =========================================================================
// Archive inspection
// =========================================================================

/// Entry names of a zip archive in stored order.
pub fn archive_entries(path: &Path) -> Vec<String> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Read one archive entry as text. Panics with the available names on miss.
pub fn archive_text(path: &Path, name: &str) -> String {
    use std::io::Read;
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = zip.by_name(name).unwrap_or_else(|_| {
        let names = archive_entries(path);
        panic!("entry '{name}' not found. Available: {names:?}")
    });
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    text
}
