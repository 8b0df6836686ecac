//! metabump - registry metadata refresh CLI
//!
//! metabump keeps a flat, section-based metadata file current: for each
//! package it queries the upstream source of truth (GitHub releases, tags,
//! and branch heads, crates.io, the Arch Linux repositories and AUR, or a
//! Cargo manifest on a repository branch), then rewrites only the entries
//! whose value actually changed.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Select → Fetch → Aggregate → Apply → Persist
//! - [`store`] - The sectioned key/value document and its scalar codec
//! - [`recipes`] - Per-package fetch recipes and the adapter seam
//! - [`fetch`] - Source-specific upstream lookups over HTTP
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! 1. A refresh run writes the file at most once, and only when a value
//!    actually changed
//! 2. If any package's fetch fails, nothing is written - partial upstream
//!    data never reaches the file
//! 3. Updates rewrite single entry lines in place; comments, blank lines,
//!    and formatting elsewhere are preserved byte for byte

pub mod cli;
pub mod engine;
pub mod fetch;
pub mod recipes;
pub mod store;
pub mod ui;
