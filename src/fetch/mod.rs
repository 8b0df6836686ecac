//! fetch
//!
//! Upstream lookups: stateless async functions that take parameters and the
//! shared [`Http`] client and return version or checksum strings.
//!
//! # Modules
//!
//! - [`github`] - release, tag, and branch-head lookups via the GitHub API
//! - [`crates_io`] - latest stable version of a crate
//! - [`arch`] - Arch Linux official repository and AUR version lookups
//! - [`manifest`] - crate version read from a Cargo manifest on a branch
//! - [`digest`] - SHA-256 of an artifact fetched over HTTP
//!
//! # Design
//!
//! Fetchers hold no state. Retry and timeout policy live in the HTTP client
//! configuration; nothing here retries. Errors carry enough context (URL or
//! package) for the per-package diagnostics the engine prints.

pub mod arch;
pub mod crates_io;
pub mod digest;
pub mod github;
pub mod manifest;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "metabump-cli";

/// Errors from upstream lookups.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The requested resource was not found upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited by {0}")]
    RateLimited(String),

    /// The API returned an error status.
    #[error("API error from {url}: {status} - {message}")]
    ApiError {
        /// Request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Error message or body excerpt
        message: String,
    },

    /// Network or connection error.
    #[error("network error for {url}: {message}")]
    NetworkError {
        /// Request URL
        url: String,
        /// Underlying error description
        message: String,
    },

    /// A response arrived but could not be interpreted.
    #[error("unusable response from {url}: {message}")]
    Parse {
        /// Request URL
        url: String,
        /// What was wrong with the payload
        message: String,
    },

    /// A recipe needed a stored key the package does not have.
    #[error("{0}")]
    Metadata(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// HTTP client plus the GitHub credential it may attach.
///
/// The bearer token authenticates against GitHub only. It is attached per
/// request, and only when the request targets a GitHub-owned host; lookups
/// against crates.io, archlinux.org, and the AUR never see it.
#[derive(Clone)]
pub struct Http {
    client: Client,
    auth: Option<HeaderValue>,
}

impl Http {
    /// Build the client shared by all fetchers, with an optional token.
    pub fn new(token: Option<&str>) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let auth = match token {
            Some(token) => {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                        FetchError::Client(
                            "token contains characters not allowed in a header".into(),
                        )
                    })?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Http { client, auth })
    }

    /// GET request builder for `url`, authorized only toward GitHub hosts.
    fn request(&self, url: &str) -> RequestBuilder {
        let builder = self.client.get(url);
        match &self.auth {
            Some(auth) if github_host(url) => builder.header(AUTHORIZATION, auth.clone()),
            _ => builder,
        }
    }

    /// Issue a GET and fail unless the status is a success.
    pub(crate) async fn get_checked(&self, url: &str) -> Result<Response, FetchError> {
        let response = self
            .request(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        Err(match status {
            StatusCode::NOT_FOUND => FetchError::NotFound(url.to_string()),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                FetchError::RateLimited(url.to_string())
            }
            _ => FetchError::ApiError {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            },
        })
    }

    /// GET and deserialize a JSON payload.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get_checked(url).await?;
        response.json().await.map_err(|e| FetchError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// GET a plain-text body.
    pub(crate) async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_checked(url).await?;
        response.text().await.map_err(|e| FetchError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Whether `url` targets a host the GitHub token is meant for: the REST
/// API, release asset downloads, and raw file content.
fn github_host(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };
    match parsed.host_str() {
        Some(host) => {
            host == "github.com"
                || host.ends_with(".github.com")
                || host.ends_with(".githubusercontent.com")
        }
        None => false,
    }
}

/// Pull the `message` field out of a JSON error body, falling back to a
/// body excerpt. GitHub, crates.io, and the archlinux.org endpoint all
/// report errors this way.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_reaches_github_requests_only() {
        let http = Http::new(Some("ghp_secret")).unwrap();
        let github = http
            .request("https://api.github.com/repos/junegunn/fzf/releases/latest")
            .build()
            .unwrap();
        assert_eq!(
            github.headers().get(AUTHORIZATION).unwrap(),
            "Bearer ghp_secret"
        );
        for url in [
            "https://crates.io/api/v1/crates/eza",
            "https://archlinux.org/packages/extra/x86_64/bat/json/",
            "https://aur.archlinux.org/rpc/v5/info?arg[]=dust",
        ] {
            let request = http.request(url).build().unwrap();
            assert!(
                request.headers().get(AUTHORIZATION).is_none(),
                "credential leaked to {url}"
            );
        }
    }

    #[test]
    fn tokenless_requests_carry_no_authorization() {
        let http = Http::new(None).unwrap();
        let request = http
            .request("https://api.github.com/repos/neovim/neovim/tags")
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn asset_and_raw_hosts_count_as_github() {
        assert!(github_host(
            "https://github.com/junegunn/fzf/releases/download/v0.60.3/fzf.tar.gz"
        ));
        assert!(github_host(
            "https://raw.githubusercontent.com/volta-cli/volta/main/Cargo.toml"
        ));
        assert!(github_host("https://api.github.com/repos/cli/cli/tags"));
        assert!(!github_host("https://notgithub.com/owner/repo"));
        assert!(!github_host("https://crates.io/api/v1/crates/eza"));
        assert!(!github_host("not a url"));
    }

    #[test]
    fn error_message_prefers_the_json_field() {
        assert_eq!(error_message(r#"{"message": "Not Found"}"#), "Not Found");
        assert_eq!(error_message("plain body"), "plain body");
    }
}
