//! cli::args
//!
//! Command-line argument definitions using clap derive.

use clap::Parser;
use std::path::PathBuf;

/// Refresh registry package metadata from upstream sources.
///
/// Queries each package's upstream (GitHub releases, crates.io, Arch Linux,
/// a Cargo manifest on a branch) for the latest version and artifact
/// checksums, and rewrites the metadata file only when something changed.
#[derive(Parser, Debug)]
#[command(name = "metabump")]
#[command(author, version, about)]
pub struct Cli {
    /// Package to refresh (all known packages when omitted)
    pub package: Option<String>,

    /// Path of the metadata file
    #[arg(short, long, default_value = "metadata.toml")]
    pub file: PathBuf,

    /// GitHub API token (avoids anonymous rate limits)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Minimal output; errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["metabump"]).unwrap();
        assert_eq!(cli.package, None);
        assert_eq!(cli.file, PathBuf::from("metadata.toml"));
        assert!(!cli.quiet);
        assert!(!cli.debug);
    }

    #[test]
    fn positional_package_and_file_flag() {
        let cli = Cli::try_parse_from(["metabump", "fzf", "--file", "pkgs/meta.toml"]).unwrap();
        assert_eq!(cli.package.as_deref(), Some("fzf"));
        assert_eq!(cli.file, PathBuf::from("pkgs/meta.toml"));
    }
}
