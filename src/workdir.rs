//! Working-directory primitives: recursive copy and force-delete.
//!
//! Every run starts from a clean slate. The working directory is cleared with
//! [`force_delete`] and then recreated as a full copy of the extracted template
//! with [`copy_dir_recursive`]. All generation and substitution happens in that
//! copy; the template directory itself is never modified.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WorkdirError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl WorkdirError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Counts of what a copy produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
}

/// Recursively copy `src` into `dst`.
///
/// Destination directories are created as needed (empty source directories
/// included) and existing files are overwritten. Relative paths come from
/// `strip_prefix`, so separators and partial-name matches are never an issue.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<CopyStats, WorkdirError> {
    let mut stats = CopyStats::default();
    fs::create_dir_all(dst).map_err(|e| WorkdirError::io(dst, e))?;

    for entry in WalkDir::new(src)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir entries are rooted at src");
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| WorkdirError::io(&target, e))?;
            info!(op = "copy_dir", from = %entry.path().display(), to = %target.display());
            stats.dirs += 1;
        } else {
            debug!(op = "copy_file", from = %entry.path().display(), to = %target.display());
            fs::copy(entry.path(), &target).map_err(|e| WorkdirError::io(entry.path(), e))?;
            stats.files += 1;
        }
    }
    Ok(stats)
}

/// Remove `path` whether it is a file or a directory tree.
///
/// Tries a file removal first, then a recursive directory removal. Both
/// failures are discarded: a missing target, a permission problem, or the
/// wrong kind all leave the call a no-op. This is the idempotent "clear"
/// used before copying and archiving.
pub fn force_delete(path: &Path) {
    let _ = fs::remove_file(path);
    let _ = fs::remove_dir_all(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn copy_preserves_tree_and_bytes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("designmap.xml"), b"<Document/>");
        write(&src.join("Spreads/Spread_A.xml"), b"<Spread/>");
        write(&src.join("Resources/Fonts/deep/font.bin"), &[0, 159, 146, 150]);

        let dst = tmp.path().join("dst");
        let stats = copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(stats.files, 3);
        for rel in ["designmap.xml", "Spreads/Spread_A.xml", "Resources/Fonts/deep/font.bin"] {
            assert_eq!(
                fs::read(src.join(rel)).unwrap(),
                fs::read(dst.join(rel)).unwrap(),
                "{rel} differs"
            );
        }
    }

    #[test]
    fn copy_recreates_empty_directories() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("XML/empty")).unwrap();

        let dst = tmp.path().join("dst");
        let stats = copy_dir_recursive(&src, &dst).unwrap();

        assert!(dst.join("XML/empty").is_dir());
        assert_eq!(stats.dirs, 2);
        assert_eq!(stats.files, 0);
    }

    #[cfg(unix)]
    #[test]
    fn copy_follows_symlinked_directories() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("real/Spread_A.xml"), b"<Spread/>");
        std::os::unix::fs::symlink(src.join("real"), src.join("link")).unwrap();

        let dst = tmp.path().join("dst");
        let stats = copy_dir_recursive(&src, &dst).unwrap();

        assert!(dst.join("link").is_dir());
        assert_eq!(
            fs::read_to_string(dst.join("link/Spread_A.xml")).unwrap(),
            "<Spread/>"
        );
        assert_eq!(stats.files, 2);
    }

    #[test]
    fn copy_overwrites_existing_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write(&src.join("a.xml"), b"new");
        write(&dst.join("a.xml"), b"old contents");

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.xml")).unwrap(), "new");
    }

    #[test]
    fn copy_missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = copy_dir_recursive(&tmp.path().join("nope"), &tmp.path().join("dst"));
        assert!(matches!(result, Err(WorkdirError::Walk(_))));
    }

    #[test]
    fn force_delete_missing_path_is_noop() {
        let tmp = TempDir::new().unwrap();
        force_delete(&tmp.path().join("does-not-exist"));
    }

    #[test]
    fn force_delete_removes_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("out.idml");
        fs::write(&file, b"zip").unwrap();

        force_delete(&file);

        assert!(!file.exists());
    }

    #[test]
    fn force_delete_removes_directory_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        write(&dir.join("Spreads/Spread_A.xml"), b"<Spread/>");

        force_delete(&dir);

        assert!(!dir.exists());
    }
}
