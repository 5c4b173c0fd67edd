//! Content spread generation.
//!
//! The template author supplies one spread fragment,
//! `Spreads/Spread_<name>.xml`, laid out for two photos. This module clones it
//! once per pair of photos and collects an `idPkg:Spread` reference node for
//! each clone. The joined nodes become the `[SPREADS]` variable, which the
//! template's `designmap.xml` uses to register the new spreads.
//!
//! ## Placeholders
//!
//! | Token | Value for the pair starting at photo index `i` |
//! |-------|------------------------------------------------|
//! | `[PHOTO1]` | `file:` + path of photo `i` |
//! | `[PHOTO2]` | `file:` + path of photo `i+1`, or the missing literal |
//! | `[PAGE1_ID]` | `<name><i>` |
//! | `[PAGE2_ID]` | `<name><i+1>` |
//! | `[SPREAD_ID]` | `<name><i>` |
//!
//! ## Output
//!
//! ```text
//! Spreads/
//! ├── Spread_A.xml      # template, left in place
//! ├── Spread_A0.xml     # photos 0 and 1
//! └── Spread_A2.xml     # photos 2 and 3 (or just 2)
//! ```

use crate::config::PhotoSettings;
use crate::substitute::{SubstituteError, Substituter};
use crate::variables::VariableTable;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const SPREADS_KEY: &str = "[SPREADS]";

const SPREAD_PLACEHOLDERS: &[&str] = &[
    "[PHOTO1]",
    "[PHOTO2]",
    "[PAGE1_ID]",
    "[PAGE2_ID]",
    "[SPREAD_ID]",
];

#[derive(Error, Debug)]
pub enum SpreadError {
    #[error("Cannot read spread template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot list photo directory {path}: {source}")]
    ReadPhotos {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write spread {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Spread template path has no file stem: {0}")]
    BadTemplatePath(PathBuf),
    #[error("Cannot fill spread placeholders: {0}")]
    Placeholders(#[from] SubstituteError),
}

/// The photos that fill one spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoPair<'a> {
    Paired { first: &'a Path, second: &'a Path },
    SingleTrailing { first: &'a Path },
}

impl<'a> PhotoPair<'a> {
    pub fn first(&self) -> &'a Path {
        match *self {
            Self::Paired { first, .. } | Self::SingleTrailing { first } => first,
        }
    }

    pub fn second(&self) -> Option<&'a Path> {
        match *self {
            Self::Paired { second, .. } => Some(second),
            Self::SingleTrailing { .. } => None,
        }
    }
}

/// Split photos into consecutive pairs, the last one possibly single.
pub fn pair_photos(photos: &[PathBuf]) -> Vec<PhotoPair<'_>> {
    photos
        .chunks(2)
        .map(|chunk| match chunk {
            [first, second] => PhotoPair::Paired {
                first: first.as_path(),
                second: second.as_path(),
            },
            [first] => PhotoPair::SingleTrailing {
                first: first.as_path(),
            },
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// One spread file written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSpread {
    /// Index of the first photo in the pair. Always even.
    pub index: usize,
    pub file_name: String,
    pub path: PathBuf,
    pub single: bool,
}

impl GeneratedSpread {
    pub fn reference_node(&self) -> String {
        spread_reference_node(&self.file_name)
    }
}

/// `<idPkg:Spread src="Spreads/<file>" />`
pub fn spread_reference_node(file_name: &str) -> String {
    format!("<idPkg:Spread src=\"Spreads/{file_name}\" />")
}

/// Regular files in `dir`, filtered and ordered according to `settings`.
pub fn list_photos(dir: &Path, settings: &PhotoSettings) -> Result<Vec<PathBuf>, SpreadError> {
    let read_err = |source: std::io::Error| SpreadError::ReadPhotos {
        path: dir.to_path_buf(),
        source,
    };
    let mut photos = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !settings.extensions.is_empty() && !has_extension(&path, &settings.extensions) {
            continue;
        }
        photos.push(path);
    }
    if settings.sort {
        photos.sort();
    }
    Ok(photos)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Fill the spread template for the pair starting at photo `index`.
///
/// All five tokens are replaced in one pass, so a photo path that happens to
/// contain a token is written as is.
pub fn render_spread(
    template: &str,
    spread_name: &str,
    index: usize,
    pair: &PhotoPair<'_>,
    settings: &PhotoSettings,
) -> Result<String, SpreadError> {
    let photo2 = match pair.second() {
        Some(p) => format!("{}{}", settings.uri_prefix, p.display()),
        None => settings.missing.clone(),
    };

    let mut tokens = VariableTable::new();
    tokens.insert(
        "[PHOTO1]",
        format!("{}{}", settings.uri_prefix, pair.first().display()),
    );
    tokens.insert("[PHOTO2]", photo2);
    tokens.insert("[PAGE1_ID]", format!("{spread_name}{index}"));
    tokens.insert("[PAGE2_ID]", format!("{spread_name}{}", index + 1));
    tokens.insert("[SPREAD_ID]", format!("{spread_name}{index}"));

    Ok(Substituter::new(&tokens)?.apply(template))
}

/// File name of the generated spread: template stem + index + `.xml`.
fn spread_file_name(template_path: &Path, index: usize) -> Result<String, SpreadError> {
    let stem = template_path
        .file_stem()
        .ok_or_else(|| SpreadError::BadTemplatePath(template_path.to_path_buf()))?;
    Ok(format!("{}{index}.xml", stem.to_string_lossy()))
}

/// Generate one spread file per photo pair next to `template_path` and store
/// the reference nodes under [`SPREADS_KEY`] in `variables`.
///
/// The accumulated value prefixes every node with a newline, so with two
/// spreads it reads `"\n<node0>\n<node2>"`. With no photos it is empty.
pub fn create_content_spreads(
    template_path: &Path,
    spread_name: &str,
    photo_dir: &Path,
    settings: &PhotoSettings,
    variables: &mut VariableTable,
) -> Result<Vec<GeneratedSpread>, SpreadError> {
    let template =
        fs::read_to_string(template_path).map_err(|source| SpreadError::ReadTemplate {
            path: template_path.to_path_buf(),
            source,
        })?;
    for token in SPREAD_PLACEHOLDERS {
        if !template.contains(token) {
            warn!(
                op = "create_content_spreads",
                template = %template_path.display(),
                "spread template has no {token} placeholder"
            );
        }
    }

    let photos = list_photos(photo_dir, settings)?;
    info!(
        op = "create_content_spreads",
        photos = photos.len(),
        dir = %photo_dir.display()
    );

    let out_dir = template_path.parent().unwrap_or(Path::new(""));
    let mut generated = Vec::new();
    let mut nodes = String::new();

    for (n, pair) in pair_photos(&photos).iter().enumerate() {
        let index = n * 2;
        let content = render_spread(&template, spread_name, index, pair, settings)?;
        let file_name = spread_file_name(template_path, index)?;
        let path = out_dir.join(&file_name);
        fs::write(&path, content).map_err(|source| SpreadError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(op = "create_content_spreads", spread = %path.display());

        let spread = GeneratedSpread {
            index,
            file_name,
            path,
            single: pair.second().is_none(),
        };
        nodes.push('\n');
        nodes.push_str(&spread.reference_node());
        generated.push(spread);
    }

    variables.insert(SPREADS_KEY, nodes);
    Ok(generated)
}
