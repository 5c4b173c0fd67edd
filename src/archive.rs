//! IDML packaging: directory ⇄ zip archive.
//!
//! An IDML file is an ordinary zip whose entries mirror the package tree with
//! no extra root folder. Like EPUB, the root-level `mimetype` entry must come
//! first and be stored uncompressed for InDesign to sniff the package type,
//! so [`zip_dir`] writes it ahead of everything else when present. The other
//! entries follow in sorted path order and are deflated.

use crate::workdir::force_delete;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MIMETYPE: &str = "mimetype";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ArchiveError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Archive path for `rel`, always `/`-separated.
fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Zip the contents of `input_dir` into `output`.
///
/// Any existing file or directory at `output` is removed first. Returns the
/// number of entries written.
pub fn zip_dir(
    input_dir: &Path,
    output: &Path,
    compression_level: u32,
) -> Result<usize, ArchiveError> {
    force_delete(output);

    let file = File::create(output).map_err(|e| ArchiveError::io(output, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(i64::from(compression_level)));

    let mut entries = 0;
    let mimetype = input_dir.join(MIMETYPE);
    if mimetype.is_file() {
        zip.start_file(MIMETYPE, stored)?;
        let bytes = fs::read(&mimetype).map_err(|e| ArchiveError::io(&mimetype, e))?;
        zip.write_all(&bytes)
            .map_err(|e| ArchiveError::io(output, e))?;
        entries += 1;
    }

    for entry in WalkDir::new(input_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(input_dir)
            .expect("walkdir entries are rooted at input_dir");
        let name = entry_name(rel);
        if name == MIMETYPE {
            continue;
        }

        if entry.file_type().is_dir() {
            let empty = is_empty_dir(entry.path()).map_err(|e| ArchiveError::io(entry.path(), e))?;
            if empty {
                zip.add_directory(name.as_str(), deflated)?;
                entries += 1;
            }
            continue;
        }

        debug!(op = "zip_template", entry = %name);
        zip.start_file(name.as_str(), deflated)?;
        let mut src = File::open(entry.path()).map_err(|e| ArchiveError::io(entry.path(), e))?;
        io::copy(&mut src, &mut zip).map_err(|e| ArchiveError::io(entry.path(), e))?;
        entries += 1;
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| ArchiveError::io(output, e))?;

    info!(
        op = "zip_template",
        from = %input_dir.display(),
        to = %output.display(),
        entries
    );
    Ok(entries)
}

/// Extract `archive` into `out_dir`, replacing whatever was there.
///
/// Entries whose names would escape `out_dir` are skipped.
pub fn extract(archive: &Path, out_dir: &Path) -> Result<usize, ArchiveError> {
    force_delete(out_dir);
    fs::create_dir_all(out_dir).map_err(|e| ArchiveError::io(out_dir, e))?;

    let file = File::open(archive).map_err(|e| ArchiveError::io(archive, e))?;
    let mut zip = ZipArchive::new(file)?;
    let mut extracted = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => out_dir.join(path),
            None => continue,
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| ArchiveError::io(&outpath, e))?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }
        let mut outfile = File::create(&outpath).map_err(|e| ArchiveError::io(&outpath, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| ArchiveError::io(&outpath, e))?;
        extracted += 1;
    }

    info!(
        op = "unzip_template",
        from = %archive.display(),
        to = %out_dir.display(),
        files = extracted
    );
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package(root: &Path) {
        fs::create_dir_all(root.join("Spreads")).unwrap();
        fs::create_dir_all(root.join("XML/empty")).unwrap();
        fs::write(root.join("mimetype"), "application/vnd.adobe.indesign-idml-package").unwrap();
        fs::write(root.join("designmap.xml"), "<Document/>").unwrap();
        fs::write(root.join("Spreads/Spread_A0.xml"), "<Spread/>").unwrap();
    }

    fn entry_names(archive: &Path) -> Vec<String> {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        package(&dir);
        let out = tmp.path().join("out.idml");

        zip_dir(&dir, &out, 6).unwrap();

        let mut zip = ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let first = zip.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn entries_mirror_tree_without_root_folder() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        package(&dir);
        let out = tmp.path().join("out.idml");

        let count = zip_dir(&dir, &out, 6).unwrap();

        let names = entry_names(&out);
        assert_eq!(count, names.len());
        assert_eq!(
            names,
            vec![
                "mimetype",
                "Spreads/Spread_A0.xml",
                "XML/empty/",
                "designmap.xml",
            ]
        );
    }

    #[test]
    fn round_trip_reproduces_bytes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        package(&dir);
        fs::write(dir.join("Spreads/binary.bin"), [0u8, 1, 2, 255, 254]).unwrap();
        let out = tmp.path().join("out.idml");
        zip_dir(&dir, &out, 9).unwrap();

        let back = tmp.path().join("back");
        extract(&out, &back).unwrap();

        for rel in [
            "mimetype",
            "designmap.xml",
            "Spreads/Spread_A0.xml",
            "Spreads/binary.bin",
        ] {
            assert_eq!(
                fs::read(dir.join(rel)).unwrap(),
                fs::read(back.join(rel)).unwrap(),
                "{rel} differs"
            );
        }
        assert!(back.join("XML/empty").is_dir());
    }

    #[test]
    fn existing_output_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        package(&dir);
        let out = tmp.path().join("out.idml");
        fs::create_dir_all(out.join("stale")).unwrap();

        zip_dir(&dir, &out, 6).unwrap();

        assert!(out.is_file());
    }

    #[test]
    fn works_without_mimetype() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.xml"), "a").unwrap();
        let out = tmp.path().join("out.idml");

        zip_dir(&dir, &out, 1).unwrap();

        assert_eq!(entry_names(&out), vec!["a.xml"]);
    }

    #[test]
    fn extract_clears_previous_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("work");
        package(&dir);
        let out = tmp.path().join("out.idml");
        zip_dir(&dir, &out, 6).unwrap();

        let target = tmp.path().join("template");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("leftover.xml"), "old").unwrap();

        let files = extract(&out, &target).unwrap();

        assert_eq!(files, 3);
        assert!(!target.join("leftover.xml").exists());
    }

    #[test]
    fn extract_skips_entries_outside_target() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.idml");
        let mut zip = ZipWriter::new(File::create(&archive).unwrap());
        let options = SimpleFileOptions::default();
        zip.start_file("../escape.xml", options).unwrap();
        zip.write_all(b"<escaped/>").unwrap();
        zip.start_file("ok.xml", options).unwrap();
        zip.write_all(b"<ok/>").unwrap();
        zip.finish().unwrap();

        let target = tmp.path().join("out");
        let files = extract(&archive, &target).unwrap();

        assert_eq!(files, 1);
        assert!(target.join("ok.xml").is_file());
        assert!(!tmp.path().join("escape.xml").exists());
        assert!(!target.join("escape.xml").exists());
    }

    #[test]
    fn extract_missing_archive_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = extract(&tmp.path().join("nope.idml"), &tmp.path().join("out"));
        assert!(matches!(result, Err(ArchiveError::Io { .. })));
    }
}
