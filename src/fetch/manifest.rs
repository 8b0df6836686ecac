//! fetch::manifest
//!
//! Crate version read from a Cargo manifest on a repository branch.
//!
//! Some packages (volta) develop against a branch and never publish
//! releases; their version of record is `package.version` in `Cargo.toml`
//! at the branch head, fetched raw from GitHub.

use serde::Deserialize;

use super::{FetchError, Http};

#[derive(Debug, Deserialize)]
struct Manifest {
    package: ManifestPackage,
}

#[derive(Debug, Deserialize)]
struct ManifestPackage {
    version: String,
}

/// `package.version` from `path` (e.g. `Cargo.toml`) on `branch` of `repo`.
pub async fn crate_version(
    http: &Http,
    repo: &str,
    branch: &str,
    path: &str,
) -> Result<String, FetchError> {
    let url = format!("https://raw.githubusercontent.com/{repo}/{branch}/{path}");
    let body = http.get_text(&url).await?;
    let manifest: Manifest = toml::from_str(&body).map_err(|e| FetchError::Parse {
        url,
        message: e.to_string(),
    })?;
    Ok(manifest.package.version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_version_parses() {
        let manifest: Manifest = toml::from_str(
            "[package]\nname = \"volta\"\nversion = \"2.0.2\"\nedition = \"2021\"\n",
        )
        .unwrap();
        assert_eq!(manifest.package.version, "2.0.2");
    }
}
