//! ui
//!
//! User-facing output utilities.
//!
//! # Design
//!
//! All status, audit, and diagnostic lines go through [`output`] so the
//! `--quiet` and `--debug` flags are honored consistently. Errors always
//! reach stderr regardless of verbosity.

pub mod output;

pub use output::Verbosity;
