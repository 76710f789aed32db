//! Request plumbing for the unlocking API.
//!
//! Every call is a single `POST {base}/request` with
//! `{url, zone, format: "raw", data_format: "markdown"}` and bearer auth. The
//! response body is markdown text and is handed back untouched, with its status.
use std::time::Duration;

use serde::Serialize;
use unblock_common::{Result, UnblockError};
use unblock_config::UnlockerConfig;
use unblock_http::{HttpClient, HttpError, RequestOpts, TextResponse};

use crate::credentials::Credentials;

pub const UNLOCK_PATH: &str = "request";

#[derive(Debug, Serialize)]
struct UnlockRequest<'a> {
    url: &'a str,
    zone: &'a str,
    format: &'static str,
    data_format: &'static str,
}

#[derive(Clone)]
pub struct UnlockerClient {
    http: HttpClient,
    credentials: Credentials,
}

impl UnlockerClient {
    /// Resolve credentials and the API base from configuration.
    ///
    /// Fails with [`UnblockError::Config`] before any network traffic when the
    /// API key is missing or the base URL is malformed.
    pub fn new(config: &UnlockerConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        Self::with_credentials(&config.base_url, credentials)
    }

    pub fn with_credentials(base_url: &str, credentials: Credentials) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| UnblockError::Config(format!("invalid unlocker base_url: {e}")))?;
        Ok(Self { http, credentials })
    }

    pub fn zone(&self) -> &str {
        self.credentials.zone()
    }

    /// Fetch `target` through the unlocking API as markdown.
    pub async fn fetch_markdown(
        &self,
        target: &str,
        timeout: Duration,
    ) -> std::result::Result<TextResponse, HttpError> {
        self.http
            .post_json_text(UNLOCK_PATH, &self.body(target), self.opts(timeout))
            .await
    }

    /// Blocking twin of [`UnlockerClient::fetch_markdown`].
    pub fn fetch_markdown_blocking(
        &self,
        target: &str,
        timeout: Duration,
    ) -> std::result::Result<TextResponse, HttpError> {
        self.http
            .post_json_text_blocking(UNLOCK_PATH, &self.body(target), self.opts(timeout))
    }

    fn body<'a>(&'a self, target: &'a str) -> UnlockRequest<'a> {
        UnlockRequest {
            url: target,
            zone: self.credentials.zone(),
            format: "raw",
            data_format: "markdown",
        }
    }

    fn opts(&self, timeout: Duration) -> RequestOpts<'_> {
        RequestOpts {
            timeout: Some(timeout),
            bearer: Some(self.credentials.token()),
        }
    }
}

impl std::fmt::Debug for UnlockerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockerClient")
            .field("base", &self.http.base().as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_has_fixed_format_fields() {
        let client = UnlockerClient::with_credentials(
            "https://api.example.com/",
            Credentials::new("tok", "unblocker").unwrap(),
        )
        .unwrap();
        let body = serde_json::to_value(client.body("https://example.org/a b")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "url": "https://example.org/a b",
                "zone": "unblocker",
                "format": "raw",
                "data_format": "markdown"
            })
        );
    }

    #[test]
    fn bad_base_url_is_a_config_error() {
        let err = UnlockerClient::with_credentials(
            "not a url",
            Credentials::new("tok", "unblocker").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, UnblockError::Config(_)));
    }

    #[test]
    fn missing_key_fails_before_client_is_built() {
        let err = UnlockerClient::new(&UnlockerConfig::default()).unwrap_err();
        assert!(err.is_fatal());
    }
}
