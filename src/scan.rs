//! Export tree scanning.
//!
//! Stage 1 of the migration. Walks the export directory and lists every file
//! the URL normalizer should look at. A builder export looks like this:
//!
//! ```text
//! export/
//! ├── htaccess                 # Rewrite-rule manifest
//! ├── index.html
//! ├── page123.html             # Flat legacy page names
//! ├── page456.html
//! ├── css/
//! │   └── tilda-grid-3.0.min.css
//! ├── js/
//! │   └── tilda-scripts-3.0.min.js
//! └── images/                  # Excluded: binary assets only
//!     └── tild3061-logo.png
//! ```
//!
//! The excluded directory (default `images`) is pruned wherever it appears in
//! the tree, so its files are never read.

use crate::config::ScanConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Export directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Export path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to walk export directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// List every file under `root` outside the excluded directory.
///
/// Paths are absolute (the root is canonicalized first) and sorted.
pub fn scan_export(root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = root
        .canonicalize()
        .map_err(|_| ScanError::NotFound(root.to_path_buf()))?;

    let mut pages = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, config));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            pages.push(entry.into_path());
        }
    }

    Ok(pages)
}

/// Whether a walked entry is the excluded directory. The root itself never is.
fn is_excluded(entry: &DirEntry, config: &ScanConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name() == config.excluded_dir.as_str()
}
