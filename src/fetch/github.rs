//! fetch::github
//!
//! Version discovery via the GitHub REST API.
//!
//! # Endpoints
//!
//! - `GET /repos/{repo}/releases/latest` - newest published release
//! - `GET /repos/{repo}/tags?per_page=1` - most recent tag (for projects
//!   that tag without publishing releases)
//! - `GET /repos/{repo}/commits/{branch}` - branch head commit
//!
//! Release and tag names conventionally carry a leading `v` (`v0.60.3`);
//! the stored `VERSION` value never does, so both are reported.

use serde::Deserialize;

use super::{FetchError, Http};

/// GitHub API base URL.
const API_BASE: &str = "https://api.github.com";

/// A discovered release or tag: the raw tag plus the normalized version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedVersion {
    /// Tag name exactly as upstream publishes it, e.g. `v0.60.3`
    pub tag: String,
    /// Tag with any leading `v` stripped, e.g. `0.60.3`
    pub version: String,
}

impl TaggedVersion {
    fn from_tag(tag: String) -> Self {
        let version = tag.strip_prefix('v').unwrap_or(&tag).to_string();
        TaggedVersion { tag, version }
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

/// Latest published release of `repo` (an `owner/name` slug).
pub async fn latest_release(http: &Http, repo: &str) -> Result<TaggedVersion, FetchError> {
    let url = format!("{API_BASE}/repos/{repo}/releases/latest");
    let release: Release = http.get_json(&url).await?;
    Ok(TaggedVersion::from_tag(release.tag_name))
}

/// Most recently created tag of `repo`.
pub async fn latest_tag(http: &Http, repo: &str) -> Result<TaggedVersion, FetchError> {
    let url = format!("{API_BASE}/repos/{repo}/tags?per_page=1");
    let tags: Vec<Tag> = http.get_json(&url).await?;
    let tag = tags.into_iter().next().ok_or_else(|| FetchError::Parse {
        url,
        message: "repository has no tags".into(),
    })?;
    Ok(TaggedVersion::from_tag(tag.name))
}

/// Full SHA of the head commit of `branch` in `repo`.
pub async fn branch_commit(http: &Http, repo: &str, branch: &str) -> Result<String, FetchError> {
    let url = format!("{API_BASE}/repos/{repo}/commits/{branch}");
    let commit: CommitRef = http.get_json(&url).await?;
    Ok(commit.sha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_version_strips_leading_v() {
        let tv = TaggedVersion::from_tag("v0.60.3".into());
        assert_eq!(tv.tag, "v0.60.3");
        assert_eq!(tv.version, "0.60.3");
    }

    #[test]
    fn tagged_version_keeps_bare_tags() {
        let tv = TaggedVersion::from_tag("20250528".into());
        assert_eq!(tv.tag, "20250528");
        assert_eq!(tv.version, "20250528");
    }
}
