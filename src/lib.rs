//! # site-export-fix
//!
//! Makes a site builder's static export deployable from a plain file server.
//! Exports from hosted builders assume the builder's own infrastructure: asset
//! URLs point at the builder's CDN, and pretty page URLs only work through
//! Apache rewrite rules. This crate fixes both, in place.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan       export/          →  file list        (images/ pruned)
//! 2. Normalize  file list        →  files rewritten  ("https://cdn…/js/a.js" → "/js/a.js")
//! 3. Relocate   export/htaccess  →  <folder>/index.html per rule, links made root-relative
//! ```
//!
//! Stages run once, in order, single-threaded. Each one reads whole files,
//! transforms them in memory and writes them back only when they changed.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1 — lists the export's files, skipping the images subtree |
//! | [`normalize`] | Stage 2 — rewrites absolute CDN URLs on trusted hosts to root-relative paths |
//! | [`rules`] | `RewriteRule` manifest parsing and per-rule classification |
//! | [`relocate`] | Stage 3 — copies each rule's page to `<folder>/index.html` |
//! | [`links`] | Root-relative `href`/`src` fixing for relocated pages |
//! | [`migrate`] | Runs the three stages over one export |
//! | [`config`] | Defaults, TOML overrides and validation |
//!
//! # Design Decisions
//!
//! ## Copy, Don't Move
//!
//! Relocation copies the flat page instead of moving it. Several rules often
//! point at the same page (`^about$` and `/about/`), and links elsewhere in the
//! site may still use the flat name.
//!
//! ## Trusted Hosts, Not Marker Strings
//!
//! A URL is only rewritten when its parsed host contains a configured marker
//! (default `tilda`). Third-party CDNs that happen to serve `/js/…` paths are
//! left alone.
//!
//! ## Not Re-entrant
//!
//! Rules name the flat source pages of a pristine export. Running the
//! migration twice over the same tree is unsupported; the relocator warns when
//! it is about to replace an `index.html` it did not write itself.

pub mod config;
pub mod links;
pub mod migrate;
pub mod normalize;
pub mod relocate;
pub mod rules;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
