mod config;
mod deduper;
mod error;

use clap::{ArgAction, Parser};
use config::{Config, USAGE};
use deduper::Deduper;
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprint!("{e}");
            println!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(args.verbose);

    let config = match Config::from_args(args.input, args.output, args.extensions.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match Deduper::from_config(&config).traverse(&config.input_dir) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `DEDUPER_LOG` wins over the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("DEDUPER_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Copy each distinct file of a directory tree once into a hash-sharded output directory
#[derive(Parser, Debug)]
// help and version flags would exit 0; every non-conforming argument list exits 1
#[command(about, long_about = None, disable_help_flag = true, disable_version_flag = true)]
struct Args {
    /// Directory to recursively read files from
    #[arg(index = 1)]
    input: PathBuf,

    /// Directory the deduplicated copies are stored under
    #[arg(index = 2)]
    output: PathBuf,

    /// Comma-separated extensions to include, without the dot (e.g. jpg,png)
    #[arg(index = 3)]
    extensions: Option<String>,

    /// Log more (-v copies, -vv skips, -vvv directories)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}
