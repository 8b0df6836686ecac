//! cli
//!
//! Command-line interface layer for metabump.
//!
//! # Responsibilities
//!
//! - Parse arguments and flags
//! - Build the async runtime and hand the run to [`crate::engine`]
//! - Print the final status line
//!
//! The CLI layer is thin: it performs no fetching and no file mutation
//! itself. All of that flows through the engine.

pub mod args;

pub use args::Cli;

use anyhow::{Context, Result};

use crate::engine::{self, Outcome};
use crate::recipes::RegistryAdapter;
use crate::ui::output;
use crate::ui::Verbosity;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    let adapter = RegistryAdapter::new(cli.token.as_deref())
        .context("failed to build the HTTP client")?;
    let opts = engine::Options {
        file: cli.file.clone(),
        package: cli.package.clone(),
        verbosity,
    };

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(engine::run(&adapter, &opts))?;

    match outcome {
        Outcome::Updated => output::print(format!("updated {}", cli.file.display()), verbosity),
        Outcome::UpToDate => output::print("already up to date", verbosity),
    }
    Ok(())
}
