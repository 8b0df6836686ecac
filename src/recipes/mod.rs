//! recipes
//!
//! Per-package fetch recipes: the table that says, for each package the
//! metadata file knows, which upstream lookups produce its keys.
//!
//! # Design
//!
//! A recipe is a list of [`Source`] variants. Each variant is one
//! independent lookup producing one key/value set; the engine runs a
//! package's sources concurrently and merges the sets. Dispatch is an
//! explicit static table keyed by package name - adding a package means
//! adding a row, not a type.
//!
//! The [`Adapter`] trait is the seam between the engine and the network:
//! the production [`RegistryAdapter`] turns table rows into real HTTP
//! lookups, while tests substitute scripted results.
//!
//! # Asset URL templates
//!
//! Checksum sources name the artifact with a URL template; `{repo}` comes
//! from the package's stored `REPO` key, `{tag}` and `{version}` from the
//! release discovered in the same lookup.

use std::future::Future;
use std::pin::Pin;

use crate::fetch;
use crate::fetch::github::TaggedVersion;
use crate::fetch::{FetchError, Http};
use crate::store::{KeyValues, PackageView};

/// One in-flight sub-fetch: resolves to a key/value set or fails.
pub type Subfetch = Pin<Box<dyn Future<Output = Result<KeyValues, FetchError>> + Send>>;

/// Resolves a package to its sub-fetches.
///
/// Returns `None` for a package the recipe table does not know; the engine
/// warns and treats that package's contribution as empty.
pub trait Adapter: Send + Sync {
    /// Sub-fetch futures for the package in `view`, or `None` if unknown.
    fn subfetches(&self, view: &PackageView) -> Option<Vec<Subfetch>>;
}

/// One upstream lookup a package performs during refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Latest GitHub release version of the stored `REPO`.
    GithubRelease {
        /// Key receiving the normalized version
        key: &'static str,
    },
    /// Latest GitHub release version plus the SHA-256 of one release asset.
    ReleaseAsset {
        /// Key receiving the normalized version
        version_key: &'static str,
        /// Key receiving the asset digest
        sha_key: &'static str,
        /// Asset URL template (`{repo}`, `{tag}`, `{version}`)
        asset: &'static str,
    },
    /// Like [`Source::ReleaseAsset`], but stores the tag verbatim - for
    /// projects whose tags are not version numbers (dated snapshots).
    TagAsset {
        /// Key receiving the unmodified tag
        tag_key: &'static str,
        /// Key receiving the asset digest
        sha_key: &'static str,
        /// Asset URL template (`{repo}`, `{tag}`)
        asset: &'static str,
    },
    /// Most recent GitHub tag, for projects that tag without releasing.
    GithubTag {
        /// Key receiving the normalized version
        key: &'static str,
    },
    /// Head commit of a branch of the stored `REPO`.
    BranchCommit {
        /// Branch to resolve
        branch: &'static str,
        /// Key receiving the full commit SHA
        key: &'static str,
    },
    /// Latest stable version on crates.io.
    CratesIo {
        /// Crate to look up
        crate_name: &'static str,
        /// Key receiving the version
        key: &'static str,
    },
    /// `pkgver` in an official Arch Linux repository.
    ArchRepo {
        /// Repository name (`core`, `extra`)
        repo: &'static str,
        /// Package name within the repository
        package: &'static str,
        /// Key receiving the version
        key: &'static str,
    },
    /// Version in the AUR (pkgrel stripped).
    Aur {
        /// AUR package name
        package: &'static str,
        /// Key receiving the version
        key: &'static str,
    },
    /// `package.version` from a Cargo manifest on a branch of `REPO`.
    CargoManifest {
        /// Branch holding the manifest
        branch: &'static str,
        /// Manifest path within the repository
        path: &'static str,
        /// Key receiving the version
        key: &'static str,
    },
}

impl Source {
    /// Run this lookup for the package in `view`.
    pub async fn resolve(
        &self,
        http: &Http,
        view: &PackageView,
    ) -> Result<KeyValues, FetchError> {
        match *self {
            Source::GithubRelease { key } => {
                let tv = fetch::github::latest_release(http, &repo_of(view)?).await?;
                Ok(KeyValues::from([(key.to_string(), tv.version)]))
            }
            Source::ReleaseAsset {
                version_key,
                sha_key,
                asset,
            } => {
                let repo = repo_of(view)?;
                let tv = fetch::github::latest_release(http, &repo).await?;
                let sha = fetch::digest::sha256_url(http, &asset_url(asset, &repo, &tv)).await?;
                Ok(KeyValues::from([
                    (version_key.to_string(), tv.version),
                    (sha_key.to_string(), sha),
                ]))
            }
            Source::TagAsset {
                tag_key,
                sha_key,
                asset,
            } => {
                let repo = repo_of(view)?;
                let tv = fetch::github::latest_release(http, &repo).await?;
                let sha = fetch::digest::sha256_url(http, &asset_url(asset, &repo, &tv)).await?;
                Ok(KeyValues::from([
                    (tag_key.to_string(), tv.tag),
                    (sha_key.to_string(), sha),
                ]))
            }
            Source::GithubTag { key } => {
                let tv = fetch::github::latest_tag(http, &repo_of(view)?).await?;
                Ok(KeyValues::from([(key.to_string(), tv.version)]))
            }
            Source::BranchCommit { branch, key } => {
                let sha = fetch::github::branch_commit(http, &repo_of(view)?, branch).await?;
                Ok(KeyValues::from([(key.to_string(), sha)]))
            }
            Source::CratesIo { crate_name, key } => {
                let version = fetch::crates_io::latest_version(http, crate_name).await?;
                Ok(KeyValues::from([(key.to_string(), version)]))
            }
            Source::ArchRepo { repo, package, key } => {
                let version = fetch::arch::repo_version(http, repo, package).await?;
                Ok(KeyValues::from([(key.to_string(), version)]))
            }
            Source::Aur { package, key } => {
                let version = fetch::arch::aur_version(http, package).await?;
                Ok(KeyValues::from([(key.to_string(), version)]))
            }
            Source::CargoManifest { branch, path, key } => {
                let version =
                    fetch::manifest::crate_version(http, &repo_of(view)?, branch, path).await?;
                Ok(KeyValues::from([(key.to_string(), version)]))
            }
        }
    }
}

/// The recipe table. Keys follow the stored upper-case convention.
static RECIPES: &[(&str, &[Source])] = &[
    (
        "fzf",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/fzf-{version}-linux_amd64.tar.gz",
        }],
    ),
    (
        "jq",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/jq-linux-amd64",
        }],
    ),
    (
        "ninja",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/ninja-linux.zip",
        }],
    ),
    (
        "task",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/task_linux_amd64.tar.gz",
        }],
    ),
    (
        "nvim",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/nvim-linux-x86_64.tar.gz",
        }],
    ),
    (
        "cmake",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/cmake-{version}-linux-x86_64.tar.gz",
        }],
    ),
    (
        "tree-sitter",
        &[Source::ReleaseAsset {
            version_key: "VERSION",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/tree-sitter-linux-x64.gz",
        }],
    ),
    (
        "hack-font",
        &[Source::TagAsset {
            tag_key: "TAG",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/Hack-{tag}-ttf.zip",
        }],
    ),
    (
        "llvm-mingw",
        &[Source::TagAsset {
            tag_key: "TAG",
            sha_key: "SHA",
            asset: "https://github.com/{repo}/releases/download/{tag}/llvm-mingw-{tag}-ucrt-x86_64.zip",
        }],
    ),
    (
        "shellutils",
        &[
            Source::BranchCommit {
                branch: "main",
                key: "COMMIT",
            },
            Source::CargoManifest {
                branch: "main",
                path: "n/Cargo.toml",
                key: "n.VERSION",
            },
            Source::CargoManifest {
                branch: "main",
                path: "viopen/Cargo.toml",
                key: "viopen.VERSION",
            },
        ],
    ),
    (
        "vim",
        &[Source::GithubTag { key: "VERSION" }],
    ),
    (
        "gh",
        &[Source::GithubRelease { key: "VERSION" }],
    ),
    (
        "bat",
        &[Source::ArchRepo {
            repo: "extra",
            package: "bat",
            key: "VERSION",
        }],
    ),
    (
        "fd",
        &[Source::ArchRepo {
            repo: "extra",
            package: "fd",
            key: "VERSION",
        }],
    ),
    (
        "dust",
        &[Source::Aur {
            package: "dust",
            key: "VERSION",
        }],
    ),
    (
        "7z",
        &[Source::ArchRepo {
            repo: "extra",
            package: "p7zip",
            key: "VERSION",
        }],
    ),
    (
        "eza",
        &[Source::CratesIo {
            crate_name: "eza",
            key: "VERSION",
        }],
    ),
    (
        "cargo-binstall",
        &[Source::CratesIo {
            crate_name: "cargo-binstall",
            key: "VERSION",
        }],
    ),
    (
        "volta",
        &[Source::CargoManifest {
            branch: "main",
            path: "Cargo.toml",
            key: "VERSION",
        }],
    ),
];

/// Recipe for `package`, or None if the table does not know it.
pub fn resolve(package: &str) -> Option<&'static [Source]> {
    RECIPES
        .iter()
        .find(|(name, _)| *name == package)
        .map(|(_, sources)| *sources)
}

/// Production adapter: recipe table rows backed by real HTTP lookups.
pub struct RegistryAdapter {
    http: Http,
}

impl RegistryAdapter {
    /// Create an adapter with an optional GitHub API token.
    pub fn new(token: Option<&str>) -> Result<Self, FetchError> {
        Ok(RegistryAdapter {
            http: Http::new(token)?,
        })
    }
}

impl Adapter for RegistryAdapter {
    fn subfetches(&self, view: &PackageView) -> Option<Vec<Subfetch>> {
        let sources = resolve(view.name())?;
        Some(
            sources
                .iter()
                .map(|source| {
                    let http = self.http.clone();
                    let view = view.clone();
                    Box::pin(async move { source.resolve(&http, &view).await }) as Subfetch
                })
                .collect(),
        )
    }
}

/// Stored `REPO` key of the package, as a fetch error when absent.
fn repo_of(view: &PackageView) -> Result<String, FetchError> {
    view.repo().map_err(|e| FetchError::Metadata(e.to_string()))
}

/// Fill an asset URL template from the repo slug and discovered release.
fn asset_url(template: &str, repo: &str, tv: &TaggedVersion) -> String {
    template
        .replace("{repo}", repo)
        .replace("{tag}", &tv.tag)
        .replace("{version}", &tv.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_known_packages() {
        assert!(resolve("fzf").is_some());
        assert!(resolve("shellutils").is_some());
        assert!(resolve("left-pad").is_none());
    }

    #[test]
    fn shellutils_fans_out_to_three_subfetches() {
        assert_eq!(resolve("shellutils").unwrap().len(), 3);
    }

    #[test]
    fn asset_url_fills_all_placeholders() {
        let tv = TaggedVersion {
            tag: "v0.60.3".into(),
            version: "0.60.3".into(),
        };
        assert_eq!(
            asset_url(
                "https://github.com/{repo}/releases/download/{tag}/fzf-{version}-linux_amd64.tar.gz",
                "junegunn/fzf",
                &tv,
            ),
            "https://github.com/junegunn/fzf/releases/download/v0.60.3/fzf-0.60.3-linux_amd64.tar.gz"
        );
    }
}
