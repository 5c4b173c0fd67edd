//! Run configuration: resolved paths and optional generator settings.
//!
//! ## Path Resolution
//!
//! Only the template file and the content spread name are required. Every
//! other path defaults to the template file name with a suffix appended:
//!
//! ```text
//! book.idml                      # --template-file
//! book.idml_template/            # template dir (extracted package)
//! book.idml_tmp/                 # working dir (scratch copy)
//! book.idml_out.idml             # output archive
//! book.idml_variables.txt        # key=value substitutions
//! book.idml_config.toml          # settings (optional, used if it exists)
//! ```
//!
//! Nothing is validated here. Missing files surface when a later stage opens
//! them.
//!
//! ## Settings File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [photos]
//! sort = true           # Sort photos by file name before pairing
//! extensions = []       # Only use these extensions (empty = every file)
//! uri_prefix = "file:"  # Prefix applied to photo paths in spreads
//! missing = ""          # [PHOTO2] value for a trailing single photo
//!
//! [archive]
//! compression_level = 6 # Deflate level, 1-9
//! ```
//!
//! User values are merged over stock defaults, so the file only needs the keys
//! it overrides. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Raw run options as supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub template_file: PathBuf,
    pub content_spread_name: String,
    pub photo_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub variables_file: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
}

/// Concrete paths for one run. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub template_file: PathBuf,
    pub template_dir: PathBuf,
    pub working_dir: PathBuf,
    pub output_file: PathBuf,
    pub variables_file: PathBuf,
    pub photo_dir: PathBuf,
    pub content_spread_name: String,
    /// `<working-dir>/Spreads/Spread_<name>.xml`
    pub content_spread_template: PathBuf,
}

/// Append `suffix` to the full path string, extension included.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

impl ResolvedConfig {
    pub fn resolve(opts: &RunOptions) -> Self {
        let t = &opts.template_file;
        let template_dir = opts
            .template_dir
            .clone()
            .unwrap_or_else(|| with_suffix(t, "_template"));
        let working_dir = opts
            .working_dir
            .clone()
            .unwrap_or_else(|| with_suffix(t, "_tmp"));
        let output_file = opts
            .output_file
            .clone()
            .unwrap_or_else(|| with_suffix(t, "_out.idml"));
        let variables_file = opts
            .variables_file
            .clone()
            .unwrap_or_else(|| with_suffix(t, "_variables.txt"));
        let content_spread_template = working_dir
            .join("Spreads")
            .join(format!("Spread_{}.xml", opts.content_spread_name));

        Self {
            template_file: t.clone(),
            template_dir,
            working_dir,
            output_file,
            variables_file,
            photo_dir: opts.photo_dir.clone(),
            content_spread_name: opts.content_spread_name.clone(),
            content_spread_template,
        }
    }
}

/// Default location of the settings file for a template.
pub fn default_settings_path(template_file: &Path) -> PathBuf {
    with_suffix(template_file, "_config.toml")
}

// =============================================================================
// Settings
// =============================================================================

/// Generator settings loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub photos: PhotoSettings,
    pub archive: ArchiveSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhotoSettings {
    /// Sort the photo list by file name. Directory order is not stable.
    pub sort: bool,
    /// Lowercase extensions to accept. Empty accepts every regular file.
    pub extensions: Vec<String>,
    pub uri_prefix: String,
    /// Substituted for `[PHOTO2]` when the last spread has a single photo.
    pub missing: String,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            sort: true,
            extensions: Vec::new(),
            uri_prefix: "file:".to_string(),
            missing: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveSettings {
    pub compression_level: u32,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=9).contains(&self.archive.compression_level) {
            return Err(ConfigError::Validation(format!(
                "archive.compression_level must be 1-9, got {}",
                self.archive.compression_level
            )));
        }
        if let Some(ext) = self.photos.extensions.iter().find(|e| e.starts_with('.')) {
            return Err(ConfigError::Validation(format!(
                "photos.extensions entries must not start with '.': {ext:?}"
            )));
        }
        Ok(())
    }
}

/// Stock settings as a TOML table, the base layer for user overrides.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse settings text, merge over defaults and validate.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let merged = merge_toml(stock_defaults_value(), overlay);
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from an explicit file, or from the template's default
/// location if present. With neither, stock defaults apply.
///
/// An explicitly given file that does not exist is an error.
pub fn load_settings(
    explicit: Option<&Path>,
    template_file: &Path,
) -> Result<Settings, ConfigError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_settings_path(template_file);
            if !p.exists() {
                return Ok(Settings::default());
            }
            p
        }
    };
    let content = fs::read_to_string(&path)?;
    parse_settings(&content)
}
