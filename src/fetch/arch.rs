//! fetch::arch
//!
//! Arch Linux version lookups: the official repositories via the
//! archlinux.org JSON endpoint, and user packages via the AUR RPC.
//!
//! Both report `pkgver`; the AUR additionally appends the package release
//! (`1.7.1-2`), which is packaging metadata and gets stripped before the
//! value is compared with the stored one.

use serde::Deserialize;

use super::{FetchError, Http};

#[derive(Debug, Deserialize)]
struct ArchPackage {
    pkgver: String,
}

#[derive(Debug, Deserialize)]
struct AurResponse {
    results: Vec<AurInfo>,
}

#[derive(Debug, Deserialize)]
struct AurInfo {
    #[serde(rename = "Version")]
    version: String,
}

/// `pkgver` of `package` in the official repository `repo` (x86_64).
pub async fn repo_version(http: &Http, repo: &str, package: &str) -> Result<String, FetchError> {
    let url = format!("https://archlinux.org/packages/{repo}/x86_64/{package}/json/");
    let info: ArchPackage = http.get_json(&url).await?;
    Ok(info.pkgver)
}

/// Version of `package` in the AUR, with the pkgrel suffix stripped.
pub async fn aur_version(http: &Http, package: &str) -> Result<String, FetchError> {
    let url = format!("https://aur.archlinux.org/rpc/v5/info?arg[]={package}");
    let response: AurResponse = http.get_json(&url).await?;
    let info = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NotFound(format!("AUR package {package}")))?;
    Ok(strip_pkgrel(&info.version))
}

/// Drop the trailing `-<pkgrel>` from an AUR version string.
fn strip_pkgrel(version: &str) -> String {
    match version.rsplit_once('-') {
        Some((pkgver, _)) => pkgver.to_string(),
        None => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkgrel_suffix_is_stripped() {
        assert_eq!(strip_pkgrel("1.7.1-2"), "1.7.1");
        assert_eq!(strip_pkgrel("2024.05.28-1"), "2024.05.28");
    }

    #[test]
    fn version_without_pkgrel_passes_through() {
        assert_eq!(strip_pkgrel("1.7.1"), "1.7.1");
    }
}
