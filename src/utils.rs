use itertools::Itertools;
use url::Url;

/// Logs a message at info level. Kept as a thin indirection (rather than
/// calling `tracing::info!` directly at every call site) so call sites
/// read close to the teacher's original `log_i(...)` calls.
pub fn log_i(value: &str) {
    tracing::info!("{value}");
}

#[macro_export]
macro_rules! console_warn {
  ($($arg:tt)*) => (
    tracing::warn!($($arg)*)
  )
}

#[macro_export]
macro_rules! console_error {
  ($($arg:tt)*) => (
    tracing::error!($($arg)*)
  )
}

pub fn get_basename_no_extension(path: &str) -> String {
    let segments = path.split("/");
    let file_name = segments.last().unwrap_or_default();
    let dot_segments = file_name.split(".").collect_vec();
    let basename = dot_segments[0..dot_segments.len() - 1].join(".");
    return basename;
}

pub fn get_base_url(url: &Url) -> Url {
    let mut result = url.clone();
    result.set_fragment(None);
    return result.join("./").unwrap();
}

pub const PATH_SEPARATOR: &str = "/";

pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

impl ToHexString for Vec<u8> {
    fn to_hex_string(&self) -> String {
        self.iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<String>>()
            .join(" ")
    }
}
