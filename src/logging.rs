//! Run-log setup (§6 "Run log", §10.2). Installs a `tracing_subscriber`
//! that writes to stderr and, once an input file is known, to
//! `<input>_extraction.log` as the spec's run-log artifact.

use std::path::Path;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Returns the run-log path for a given input file, per §6's
/// `<input>_extraction.log` naming.
pub fn run_log_path(input_path: &Path, output_dir: &Path) -> std::path::PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("run");
    output_dir.join(format!("{stem}_extraction.log"))
}

/// Installs the global tracing subscriber. Call once per process; the
/// extraction runner binary does this, library consumers embedding this
/// crate elsewhere may install their own subscriber instead.
pub fn init(log_file: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(file))
        .with_ansi(false)
        .init();

    Ok(())
}
