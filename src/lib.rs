//! Library entry points for Director container extraction (§1, §6).
//!
//! [`extract`] is the whole pipeline: open a `.dir`/`.cst`/`.cxt` file,
//! resolve its casts and score, decompile its scripts, and write the
//! journal artifacts (`members.json`/`movie.json`/`timeline.json`/
//! `castlibs.json` plus per-member assets) to an output directory. The
//! `dirx-extract` binary is a thin `clap` wrapper around this.

pub mod config;
pub mod director;
pub mod error;
pub mod io;
pub mod journal;
pub mod logging;
pub mod utils;

use std::fs;
use std::path::Path;

use thiserror::Error;

use config::RunConfig;
use director::file::read_director_file_bytes_with_limit;

/// Top-level failure of an extraction run. Anything narrower (a malformed
/// chunk, an unrecognized opcode) is logged and downgraded at its own call
/// site per the fail-open policy (§7); this is only raised when the run as
/// a whole cannot produce output.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read input file: {0}")]
    Read(#[from] std::io::Error),

    #[error("container rejected: {0}")]
    Container(String),

    #[error("failed to write output: {0}")]
    Output(#[from] anyhow::Error),
}

/// Result of a completed run (§6 "Process exit codes" — this always
/// corresponds to exit code 0, since a rejected container surfaces as
/// `Err` instead).
pub struct ExtractSummary {
    pub member_count: usize,
    pub output_dir: std::path::PathBuf,
}

/// Runs the full extraction pipeline against `input_path` using `config`,
/// writing the journal artifacts under `config.output_dir`.
pub fn extract(input_path: &Path, config: &RunConfig) -> Result<ExtractSummary, ExtractError> {
    let bytes = fs::read(input_path)?;
    let base_path = url::Url::from_file_path(
        input_path
            .canonicalize()
            .unwrap_or_else(|_| input_path.to_path_buf()),
    )
    .map_err(|_| ExtractError::Container("input path is not a valid file URL".to_string()))?;

    let file = read_director_file_bytes_with_limit(
        &bytes,
        &input_path.to_string_lossy(),
        base_path.as_str(),
        config.internal_stream_safety_limit,
        config.max_cast_slots,
    )
    .map_err(ExtractError::Container)?;

    let output_dir = Path::new(&config.output_dir);
    let members = journal::write_all(&file, output_dir).map_err(ExtractError::Output)?;

    tracing::info!(
        member_count = members.len(),
        output_dir = %output_dir.display(),
        "extraction complete"
    );

    Ok(ExtractSummary {
        member_count: members.len(),
        output_dir: output_dir.to_path_buf(),
    })
}
