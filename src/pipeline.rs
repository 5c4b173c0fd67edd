//! The build pipeline driver.
//!
//! Runs each stage to completion before starting the next:
//!
//! ```text
//! 0. unzip_template        book.idml → book.idml_template/   (opt-in)
//! 1. prepare_working_dir   template/ → tmp/                  (fresh copy)
//! 2. prepare_variables     variables.txt → VariableTable
//! 3. create_content_spreads  Spread_<name>.xml × photo pairs, sets [SPREADS]
//! 4. replace_all_variables   every tmp/**.xml
//! 5. zip_template          tmp/ → book.idml_out.idml
//! 6. cleanup               removes tmp/ only when asked to
//! ```
//!
//! The variable table is created here and handed to the stages that need it.
//! Any error aborts the run; the working directory is left as it was at the
//! point of failure.

use crate::archive::{self, ArchiveError};
use crate::config::{ResolvedConfig, Settings};
use crate::spreads::{self, GeneratedSpread, SpreadError};
use crate::substitute::{self, SubstituteError};
use crate::variables::{self, VariablesError};
use crate::workdir::{self, WorkdirError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Extracting template failed: {0}")]
    Extract(#[source] ArchiveError),
    #[error("Preparing working directory failed: {0}")]
    Workdir(#[from] WorkdirError),
    #[error("Loading variables failed: {0}")]
    Variables(#[from] VariablesError),
    #[error("Creating content spreads failed: {0}")]
    Spreads(#[from] SpreadError),
    #[error("Replacing variables failed: {0}")]
    Substitute(#[from] SubstituteError),
    #[error("Packaging failed: {0}")]
    Package(#[source] ArchiveError),
}

/// Behaviour switches that are not paths.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Unzip the template file into the template dir before copying.
    pub extract_template: bool,
    /// Remove the working dir once the archive is written.
    pub clean: bool,
}

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output_file: PathBuf,
    pub working_dir: PathBuf,
    pub extracted_files: Option<usize>,
    pub copied_files: usize,
    pub variables: Vec<String>,
    pub spreads: Vec<GeneratedSpread>,
    pub substituted_files: Vec<PathBuf>,
    pub archive_entries: usize,
    pub cleaned: bool,
}

pub fn run(
    config: &ResolvedConfig,
    settings: &Settings,
    options: &PipelineOptions,
) -> Result<RunReport, PipelineError> {
    let extracted_files = if options.extract_template {
        Some(unzip_template(config)?)
    } else {
        None
    };

    let copied = prepare_working_dir(config)?;

    let mut vars = variables::load_variables(&config.variables_file)?;

    let spreads = spreads::create_content_spreads(
        &config.content_spread_template,
        &config.content_spread_name,
        &config.photo_dir,
        &settings.photos,
        &mut vars,
    )?;

    let substituted_files = substitute::replace_all_variables(&config.working_dir, &vars)?;

    let archive_entries = archive::zip_dir(
        &config.working_dir,
        &config.output_file,
        settings.archive.compression_level,
    )
    .map_err(PipelineError::Package)?;

    cleanup(config, options);

    Ok(RunReport {
        output_file: config.output_file.clone(),
        working_dir: config.working_dir.clone(),
        extracted_files,
        copied_files: copied.files,
        variables: vars.keys().map(str::to_string).collect(),
        spreads,
        substituted_files,
        archive_entries,
        cleaned: options.clean,
    })
}

fn unzip_template(config: &ResolvedConfig) -> Result<usize, PipelineError> {
    archive::extract(&config.template_file, &config.template_dir).map_err(PipelineError::Extract)
}

fn prepare_working_dir(config: &ResolvedConfig) -> Result<workdir::CopyStats, PipelineError> {
    workdir::force_delete(&config.working_dir);
    let stats = workdir::copy_dir_recursive(&config.template_dir, &config.working_dir)?;
    info!(
        op = "prepare_working_dir",
        from = %config.template_dir.display(),
        to = %config.working_dir.display(),
        files = stats.files
    );
    Ok(stats)
}

fn cleanup(config: &ResolvedConfig, options: &PipelineOptions) {
    if options.clean {
        workdir::force_delete(&config.working_dir);
    }
    info!(op = "cleanup", removed = options.clean);
}
