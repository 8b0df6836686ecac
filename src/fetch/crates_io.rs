//! fetch::crates_io
//!
//! Latest version lookup against the crates.io API.

use serde::Deserialize;

use super::{FetchError, Http};

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateData,
}

#[derive(Debug, Deserialize)]
struct CrateData {
    max_stable_version: Option<String>,
    max_version: String,
}

/// Latest stable version of `crate_name`, falling back to the overall
/// newest version for crates that have never published a stable release.
pub async fn latest_version(http: &Http, crate_name: &str) -> Result<String, FetchError> {
    let url = format!("https://crates.io/api/v1/crates/{crate_name}");
    let response: CrateResponse = http.get_json(&url).await?;
    Ok(response
        .krate
        .max_stable_version
        .unwrap_or(response.krate.max_version))
}
