pub mod deadline;
pub mod duration;
pub mod io;
pub mod progress;

/// Format an IO error message without the "(os error N)" suffix.
/// Rust's Display impl appends " (os error 2)"; diagnostics read better
/// as a plain "No such file or directory".
pub fn io_error_msg(e: &std::io::Error) -> String {
    match e.raw_os_error() {
        Some(raw) => std::io::Error::from_raw_os_error(raw)
            .to_string()
            .replace(&format!(" (os error {})", raw), ""),
        None => e.to_string(),
    }
}

/// Split a comma-separated list, trimming blanks and dropping empty entries.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
