//! Source collection — turns paths, directories and globs into file units.

use crate::error::{Error, Result};
use crate::model::SourceUnit;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions recognized as stylesheet sources.
const SUPPORTED_EXTENSIONS: &[&str] = &["scss"];

/// Expand patterns into source units.
///
/// A pattern may be a file, a directory (walked recursively) or a glob. A
/// pattern that matches nothing means the scan cannot begin.
pub fn collect<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<SourceUnit>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            walk(path, &mut files)?;
            continue;
        }
        let mut matches = Vec::new();
        for entry in glob::glob(pattern)? {
            let matched = entry.map_err(|err| Error::Io {
                path: err.path().display().to_string(),
                source: err.into_error(),
            })?;
            if matched.is_file() {
                matches.push(matched);
            }
        }
        if matches.is_empty() {
            return Err(Error::SourceNotFound(pattern.to_string()));
        }
        files.extend(matches);
    }

    // Sort for deterministic output
    files.sort();
    files.dedup();

    files.iter().map(|path| read(path)).collect()
}

/// Recursive `.scss` walk; any entry that cannot be read fails the scan.
fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|err| Error::Io {
            path: err.path().unwrap_or(dir).display().to_string(),
            source: err.into(),
        })?;
        let supported = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext));
        if entry.file_type().is_file() && supported {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<SourceUnit> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(SourceUnit::new(path.to_string_lossy(), content))
}
