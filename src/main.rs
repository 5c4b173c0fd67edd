use clap::{ArgAction, Parser};
use idml_gen::config::{self, ResolvedConfig, RunOptions};
use idml_gen::output;
use idml_gen::pipeline::{self, PipelineOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idml-gen")]
#[command(about = "Generate an IDML document from a template and a photo directory")]
#[command(long_about = "\
Generate an IDML document from a template and a photo directory

The extracted template is copied to a working directory. The content spread
Spreads/Spread_<name>.xml is cloned once per pair of photos, then every
[PLACEHOLDER] in every .xml file is replaced and the result is zipped.

Default paths (for --template-file book.idml):

  book.idml_template/      extracted template package
  book.idml_tmp/           working directory (recreated every run)
  book.idml_out.idml       output package
  book.idml_variables.txt  [KEY]=value lines
  book.idml_config.toml    optional settings

Spread placeholders: [PHOTO1] [PHOTO2] [PAGE1_ID] [PAGE2_ID] [SPREAD_ID]
The generated spread references are available as [SPREADS].")]
#[command(version)]
struct Cli {
    /// Print one diagnostic line per operation
    #[arg(
        short,
        long,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    verbose: bool,

    /// Template file; all default paths derive from its name
    #[arg(short, long)]
    template_file: PathBuf,

    /// Extracted template directory
    #[arg(short = 'd', long)]
    template_dir: Option<PathBuf>,

    /// Scratch working directory
    #[arg(short = 'x', long)]
    working_dir: Option<PathBuf>,

    /// Output package
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Content spread name (uses Spreads/Spread_<name>.xml)
    #[arg(short = 's', long)]
    content_spread_name: String,

    /// Variables file of [KEY]=value lines
    #[arg(short = 'r', long)]
    variables_file: Option<PathBuf>,

    /// Directory of photos, paired in file-name order
    #[arg(short, long)]
    photo_dir: PathBuf,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Unzip the template file into the template directory first
    #[arg(long)]
    extract_template: bool,

    /// Remove the working directory after packaging
    #[arg(long)]
    clean: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "idml_gen=info" } else { "idml_gen=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let opts = RunOptions {
        template_file: cli.template_file,
        content_spread_name: cli.content_spread_name,
        photo_dir: cli.photo_dir,
        template_dir: cli.template_dir,
        working_dir: cli.working_dir,
        output_file: cli.output_file,
        variables_file: cli.variables_file,
        settings_file: cli.config,
    };
    let resolved = ResolvedConfig::resolve(&opts);
    let settings = config::load_settings(opts.settings_file.as_deref(), &opts.template_file)?;

    let options = PipelineOptions {
        extract_template: cli.extract_template,
        clean: cli.clean,
    };
    let report = pipeline::run(&resolved, &settings, &options)?;

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)?;
    }
    if cli.verbose {
        output::print_run_report(&report, &resolved);
    }

    Ok(())
}
