//! Thin CLI wrapper around the library's extraction pipeline (§6, §10.2).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dirx_extract::config::RunConfig;
use dirx_extract::{extract, logging};

#[derive(Parser)]
#[command(name = "dirx-extract", about = "Extract assets and decompiled scripts from a legacy Director container")]
struct Args {
    /// Path to the `.dir`/`.cst`/`.cxt` file to extract.
    input: PathBuf,

    /// Output directory for extracted assets and journal artifacts.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = RunConfig::load(&args.input);
    if let Some(output) = &args.output {
        config.output_dir = output.to_string_lossy().into_owned();
    }

    let output_dir = PathBuf::from(&config.output_dir);
    let log_path = logging::run_log_path(&args.input, &output_dir);
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = logging::init(&log_path) {
        eprintln!("failed to initialize logging: {e}");
    }

    match extract(&args.input, &config) {
        Ok(summary) => {
            eprintln!(
                "extracted {} members to {}",
                summary.member_count,
                summary.output_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("extraction failed: {e}");
            eprintln!("extraction failed: {e}");
            ExitCode::FAILURE
        }
    }
}
