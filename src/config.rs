//! Run configuration (§10.3). Loaded from an optional `dirx.toml` beside the
//! input file or the current directory, layered under `DIRX_*` environment
//! variables (loaded through `dotenvy` before file parsing, the usual
//! dotenv-then-env-then-file-default ordering).

use std::path::Path;

use serde::Deserialize;

/// `InternalStreamSafetyLimit` from §4.2: ILS cache entries larger than
/// this abort ILS ingestion for that chunk; remaining chunks fall back to
/// on-demand inflation.
pub const DEFAULT_INTERNAL_STREAM_SAFETY_LIMIT: usize = 10 * 1024 * 1024;

/// `MaxCastSlots` from §4.5.
pub const DEFAULT_MAX_CAST_SLOTS: u32 = 32_768;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub internal_stream_safety_limit: usize,
    pub max_cast_slots: u32,
    pub worker_threads: usize,
    pub output_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            internal_stream_safety_limit: DEFAULT_INTERNAL_STREAM_SAFETY_LIMIT,
            max_cast_slots: DEFAULT_MAX_CAST_SLOTS,
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            output_dir: "out".to_string(),
        }
    }
}

impl RunConfig {
    /// Loads `dirx.toml` next to `input_path` if present, else the one in
    /// the current directory, else falls back to defaults. `DIRX_*`
    /// environment variables (including those from a `.env` file) override
    /// individual fields after the file is parsed.
    pub fn load(input_path: &Path) -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::from_toml_file(input_path)
            .or_else(|| Self::from_toml_file(Path::new(".")))
            .unwrap_or_default();

        if let Ok(v) = std::env::var("DIRX_INTERNAL_STREAM_SAFETY_LIMIT") {
            if let Ok(n) = v.parse() {
                config.internal_stream_safety_limit = n;
            }
        }
        if let Ok(v) = std::env::var("DIRX_MAX_CAST_SLOTS") {
            if let Ok(n) = v.parse() {
                config.max_cast_slots = n;
            }
        }
        if let Ok(v) = std::env::var("DIRX_WORKER_THREADS") {
            if let Ok(n) = v.parse() {
                config.worker_threads = n;
            }
        }
        if let Ok(v) = std::env::var("DIRX_OUTPUT_DIR") {
            config.output_dir = v;
        }

        config
    }

    fn from_toml_file(dir_or_file: &Path) -> Option<Self> {
        let candidate = if dir_or_file.is_dir() {
            dir_or_file.join("dirx.toml")
        } else {
            dir_or_file.parent()?.join("dirx.toml")
        };
        let text = std::fs::read_to_string(candidate).ok()?;
        toml::from_str(&text).ok()
    }
}
