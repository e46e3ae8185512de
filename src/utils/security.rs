//! Filename hygiene for payloads saved to the local filesystem.

use std::path::{Path, PathBuf};

/// Reduce a server-supplied filename to a safe basename.
///
/// Strips directory components, control characters, and leading dots so a
/// hostile filename cannot escape the chosen output directory or hide the
/// saved file.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim().trim_start_matches('.');

    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick a non-colliding path for `filename` inside `dir`.
///
/// Existing files are never overwritten; collisions get a numeric suffix
/// before the extension ("report (1).pdf").
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };

    let mut counter = 1u32;
    loop {
        let name = match extension {
            Some(ext) => format!("{stem} ({counter}).{ext}"),
            None => format!("{stem} ({counter})"),
        };
        let candidate = dir.join(&name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
