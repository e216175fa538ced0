//! Utility functions for common operations across the codebase

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time truncated to microseconds
///
/// Timestamps are rendered into download filenames, so they are kept at a
/// stable precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Split a filename into stem and extension at the last dot
///
/// The extension keeps its leading dot. Leading dots belong to the stem, so
/// dotfiles such as `.profile` or `..abc` have no extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let leading_dots = name.len() - name.trim_start_matches('.').len();
    match name.rfind('.') {
        Some(index) if index > leading_dots => name.split_at(index),
        _ => (name, ""),
    }
}
