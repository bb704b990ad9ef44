//! The full migration: scan → normalize URLs → relocate pages.

use crate::config::MigrateConfig;
use crate::normalize::{self, NormalizeError, NormalizeReport};
use crate::relocate::{self, RelocateError, RelocationReport};
use crate::scan::{self, ScanError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Relocate(#[from] RelocateError),
}

#[derive(Debug)]
pub struct MigrateReport {
    /// Files the scanner handed to the URL normalizer.
    pub scanned: usize,
    pub urls: NormalizeReport,
    pub relocation: RelocationReport,
}

/// Migrate the export at `root` in place.
///
/// Not re-entrant: rules are resolved against the flat pages of a pristine
/// export, so running twice over the same tree is unsupported.
pub fn run(root: &Path, config: &MigrateConfig) -> Result<MigrateReport, MigrateError> {
    let pages = scan::scan_export(root, &config.scan)?;
    info!("Scanned {} files in {}", pages.len(), root.display());

    let urls = normalize::normalize_urls(&pages, &config.urls)?;
    let relocation = relocate::relocate_pages(root, &config.rules)?;

    info!(
        "Done: {} URLs rewritten in {} files, {} pages relocated, {} missing, {} rules skipped",
        urls.urls,
        urls.rewritten.len(),
        relocation.relocated.len(),
        relocation.missing.len(),
        relocation.skipped.len()
    );

    Ok(MigrateReport {
        scanned: pages.len(),
        urls,
        relocation,
    })
}
