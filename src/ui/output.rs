//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Status and audit lines go to stdout, diagnostics to stderr. Quiet mode
//! suppresses everything except errors; debug mode adds trace lines for
//! fetch scheduling and key merges.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - status, audit, and warning lines
    Normal,
    /// Debug mode - everything, plus trace lines
    Debug,
}

impl Verbosity {
    /// Create verbosity from the CLI flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a status line (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug trace line (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print a warning (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}
