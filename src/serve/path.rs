//! URL to filesystem path resolution for the dev server.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL to a file inside the output directory.
///
/// Returns `None` for anything that escapes the root, fails to decode,
/// or does not exist. Directory URLs resolve to their `index.html`.
pub fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let relative = normalize_url(url)?;

    let candidate = if relative.is_empty() {
        root.join("index.html")
    } else {
        root.join(&relative)
    };

    let candidate = if candidate.is_dir() {
        candidate.join("index.html")
    } else {
        candidate
    };

    if !candidate.is_file() {
        return None;
    }

    // Symlinks and lingering dot segments get caught here
    let canonical = candidate.canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    canonical.starts_with(&root).then_some(candidate)
}

/// Decode and sanitize a request URL into a relative path string.
fn normalize_url(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(without_query).decode_utf8().ok()?;

    if decoded.contains('\0') {
        return None;
    }
    // Reject traversal before the path ever touches the filesystem
    if decoded.split('/').any(|segment| segment == "..") {
        return None;
    }

    Some(decoded.trim_matches('/').to_string())
}
