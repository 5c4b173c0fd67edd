//! CLI output formatting for a finished run.
//!
//! Per-operation diagnostics are emitted through `tracing` while the pipeline
//! runs. This module renders the summary printed once it completes:
//!
//! ```text
//! Template
//!     Source: book.idml_template
//!     Working: book.idml_tmp (9 files)
//!
//! Variables
//!     001 [TITLE]
//!     002 [AUTHOR]
//!     003 [SPREADS]
//!
//! Spreads
//!     001 Spread_A0.xml
//!     002 Spread_A2.xml (single photo)
//!
//! Substituted 9 files
//! Output → book.idml_out.idml (13 entries)
//! ```
//!
//! `format_*` functions are pure and return lines; `print_*` writes them to
//! stdout.

use crate::config::ResolvedConfig;
use crate::pipeline::RunReport;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn count(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

pub fn format_run_report(report: &RunReport, config: &ResolvedConfig) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Template".to_string());
    if let Some(n) = report.extracted_files {
        lines.push(format!(
            "    Extracted: {} ({})",
            config.template_file.display(),
            count(n, "file", "files")
        ));
    }
    lines.push(format!("    Source: {}", config.template_dir.display()));
    lines.push(format!(
        "    Working: {} ({})",
        report.working_dir.display(),
        count(report.copied_files, "file", "files")
    ));

    lines.push(String::new());
    lines.push("Variables".to_string());
    for (i, key) in report.variables.iter().enumerate() {
        lines.push(format!("    {} {}", format_index(i + 1), key));
    }

    lines.push(String::new());
    lines.push("Spreads".to_string());
    if report.spreads.is_empty() {
        lines.push(format!("    (no photos in {})", config.photo_dir.display()));
    }
    for (i, spread) in report.spreads.iter().enumerate() {
        let marker = if spread.single { " (single photo)" } else { "" };
        lines.push(format!(
            "    {} {}{}",
            format_index(i + 1),
            spread.file_name,
            marker
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Substituted {}",
        count(report.substituted_files.len(), "file", "files")
    ));
    lines.push(format!(
        "Output → {} ({})",
        report.output_file.display(),
        count(report.archive_entries, "entry", "entries")
    ));
    if report.cleaned {
        lines.push(format!("Removed {}", report.working_dir.display()));
    }

    lines
}

pub fn print_run_report(report: &RunReport, config: &ResolvedConfig) {
    for line in format_run_report(report, config) {
        println!("{}", line);
    }
}
