use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod check;
mod findings;
mod lambda;
mod load;
mod model;
mod spec;

pub type Result<T> = anyhow::Result<T>;

const EXIT_USAGE: u8 = 64;
const EXIT_NO_INPUT: u8 = 66;

#[derive(Parser)]
#[command(name = "hysds-validate", version)]
#[command(about = "Validate paired job-spec / hysds-io job definitions", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding the job-spec and hysds-io documents.
    directory: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().ok();
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli.directory) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[ERROR] {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(dir: &Path) -> Result<ExitCode> {
    let candidates = load::list_candidates(dir).unwrap_or_else(|err| {
        tracing::debug!(error = %format!("{:#}", err), "directory scan failed");
        Vec::new()
    });
    if candidates.is_empty() {
        eprintln!("[ERROR] No files found in directory: {}", dir.display());
        return Ok(ExitCode::from(EXIT_NO_INPUT));
    }
    tracing::info!(count = candidates.len(), dir = %dir.display(), "found candidate files");

    let naming = spec::FileNaming::new()?;
    let mut findings = findings::Findings::new();

    let docs = load::load_documents(&candidates, &mut findings);
    let units = model::pair_documents(&naming, docs, &mut findings);

    check::check_units(&units, &mut findings);

    if !findings.is_empty() {
        findings.write_to(std::io::stderr().lock())?;
    }
    tracing::info!(
        total = findings.len(),
        errors = findings.error_count(),
        warnings = findings.warning_count(),
        "validation finished"
    );

    Ok(if findings.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
