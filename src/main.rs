use clap::Parser;
use course_redate::archive::CommandBackend;
use course_redate::pipeline::{RedateOptions, redate_archive};
use course_redate::process::DateSettings;
use course_redate::{config, date, output};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "course-redate")]
#[command(version, about = "Re-date DateReplace directives in a course package")]
#[command(long_about = "\
Re-date DateReplace directives in a course package

Unpacks an .imscc (zip) course export, rewrites every text node annotated
with a DateReplace(<format>, <day>) directive, and packs the result into a
new archive.

Directive syntax (anywhere before the text node it annotates):

  <span title=\"DateReplace(MM DD, YYYY, 5)\">January 19, 2024</span>

  date = start + (day - index)
  no day number (DateReplace(Y)) means the start date itself

Format tokens:
  YYYY, Y  year            2024
  MM       month name      January      M  month abbreviation  Jan
  NN       weekday name    Friday       N  weekday abbreviation Fri
  DD       day, 2 digits   05           D  day                  5

Run 'course-redate --gen-config' to print a documented config file.")]
struct Cli {
    /// Course package to re-date (.imscc or .zip)
    #[arg(required_unless_present = "gen_config")]
    input: Option<PathBuf>,

    /// First day of the term, MM/DD/YYYY
    #[arg(long, value_name = "MM/DD/YYYY", required_unless_present = "gen_config")]
    start: Option<String>,

    /// Output package [default: <input-stem>_updated.<ext>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Day number that falls on the start date
    #[arg(short = 'i', long = "index", default_value_t = 0, allow_negative_numbers = true)]
    start_index: i64,

    /// TOML config file (see --gen-config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Unpack into this directory and leave it in place
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging (otherwise RUST_LOG, default warn)
    #[arg(short, long)]
    verbose: bool,

    /// Print a stock config file with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() {
    let cli = Cli::try_parse_from(legacy_args(std::env::args_os())).unwrap_or_else(|err| {
        // --help and --version come through here too and exit 0
        let code = if err.use_stderr() { 1 } else { 0 };
        let _ = err.print();
        std::process::exit(code);
    });

    let filter = if cli.verbose {
        EnvFilter::new("course_redate=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    // Argument errors are reported before any file I/O
    let start = cli.start.as_deref().ok_or("--start is required")?;
    let base = date::parse_start_date(start)?;
    let input = cli.input.ok_or("an input archive is required")?;
    let tool_config = config::load_config(cli.config.as_deref())?;
    init_thread_pool(&tool_config.processing);

    let options = RedateOptions {
        input,
        output: cli.output,
        work_dir: cli.work_dir,
        settings: DateSettings {
            base,
            start_index: cli.start_index,
        },
        config: tool_config,
    };
    let backend = CommandBackend::new(&options.config.archive);

    if !cli.json {
        println!("==> Re-dating {} from {}", options.input.display(), base);
    }
    let summary = redate_archive(&options, &backend)?;

    if cli.json {
        println!("{}", output::format_json(&summary)?);
    } else {
        output::print_run_output(&summary);
    }

    Ok(())
}

/// Accept the single-dash `-start` spelling older scripts pass.
fn legacy_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg == "-start" {
                OsString::from("--start")
            } else {
                arg
            }
        })
        .collect()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
