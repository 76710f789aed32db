//! Minimal HTTP client with safe logging and bearer auth for text-returning APIs.
//!
//! - Request options: bearer token, per-request timeout
//! - JSON request bodies, plain-text responses with their status (no JSON decode on success)
//! - The same request can be sent asynchronously or on the calling thread
//! - Never logs secret values; `Authorization` is always redacted
//! - Optional *raw* request/response logging via `UNBLOCK_HTTP_RAW=1`
//!
//! Requests are sent exactly once. A failed send, a failed body read, or a
//! non-2xx status is returned to the caller as an [`HttpError`].
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), unblock_http::HttpError> {
//! let client = unblock_http::HttpClient::new("https://api.example.com/")?;
//! let resp = client
//!     .post_json_text(
//!         "request",
//!         &serde_json::json!({ "url": "https://example.com" }),
//!         unblock_http::RequestOpts {
//!             bearer: Some("token"),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! assert!(resp.status.is_success());
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`).

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::StatusCode;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "UNBLOCK_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_CHARS: usize = 500;
/// Timeout used when [`RequestOpts::timeout`] is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("unblock/", env!("CARGO_PKG_VERSION"));

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: &[u8]) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if !body.is_empty() {
        match std::str::from_utf8(body) {
            Ok(s) => {
                let s = truncate_chars(s, RAW_MAX_BODY);
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", body.len())),
        }
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case("authorization") || v.is_sensitive() {
                "Bearer <redacted>".to_string()
            } else {
                v.to_str().unwrap_or("<binary>").to_string()
            };
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for [`HttpError::Api`], `None` for transport-level failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use unblock_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     bearer: Some("demo"),
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(RequestOpts::default().bearer.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Falls back to [`DEFAULT_TIMEOUT`].
    pub timeout: Option<Duration>,
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer: Option<&'a str>,
}

// ==============================
// Client
// ==============================

/// A 2xx response, body decoded as (lossy) UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
}

/// A fully resolved request, shared by the async and blocking send paths.
struct Prepared {
    req_id: String,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
    timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```
    /// use unblock_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com/")?;
    /// assert_eq!(client.base().as_str(), "https://api.example.com/");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { base, inner })
    }

    /// The URL requests are resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// POST a JSON body and return the response status and body text.
    pub async fn post_json_text<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let prepared = self.prepare(Method::POST, path, body, opts)?;
        let started = Instant::now();

        let resp = self
            .inner
            .request(prepared.method.clone(), prepared.url.clone())
            .headers(prepared.headers.clone())
            .timeout(prepared.timeout)
            .body(prepared.body.clone())
            .send()
            .await
            .map_err(|e| prepared.transport_error(e, "send"))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| prepared.transport_error(e, "body"))?;

        prepared.finish(status, &headers, &bytes, started)
    }

    /// Blocking twin of [`HttpClient::post_json_text`].
    ///
    /// Builds a short-lived blocking client per call; must not be called from
    /// inside an async executor thread (use `spawn_blocking`).
    pub fn post_json_text_blocking<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let prepared = self.prepare(Method::POST, path, body, opts)?;
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        let started = Instant::now();

        let resp = client
            .request(prepared.method.clone(), prepared.url.clone())
            .headers(prepared.headers.clone())
            .timeout(prepared.timeout)
            .body(prepared.body.clone())
            .send()
            .map_err(|e| prepared.transport_error(e, "send"))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .map_err(|e| prepared.transport_error(e, "body"))?;

        prepared.finish(status, &headers, &bytes, started)
    }

    fn prepare<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<Prepared, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let body = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(DEFAULT_TIMEOUT);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_kind = match opts.bearer {
            Some(tok) => {
                let tok = sanitize_api_key(tok)?;
                let mut value = HeaderValue::from_str(&format!("Bearer {tok}"))
                    .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                "bearer"
            }
            None => "none",
        };

        // Lightweight request id without extra deps
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            body_len=body.len(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, &headers, &body);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        Ok(Prepared {
            req_id,
            method,
            url,
            headers,
            body,
            timeout,
        })
    }
}

impl Prepared {
    fn transport_error(&self, err: reqwest::Error, stage: &'static str) -> HttpError {
        let message = err.to_string();
        tracing::warn!(
            req_id=%self.req_id,
            stage,
            timed_out=err.is_timeout(),
            message=%message,
            "http.network_error"
        );
        if err.is_timeout() {
            HttpError::Timeout(self.timeout)
        } else {
            HttpError::Network(message)
        }
    }

    fn finish(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        bytes: &[u8],
        started: Instant,
    ) -> Result<TextResponse, HttpError> {
        let dur_ms = started.elapsed().as_millis() as u64;
        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::debug!(
            req_id=%self.req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let text = String::from_utf8_lossy(bytes);
            let truncated = text.chars().count() > RAW_MAX_BODY;
            tracing::info!(
                target: "http.raw",
                req_id=%self.req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?redact_headers(headers),
                body=%truncate_chars(&text, RAW_MAX_BODY),
                truncated
            );
        }

        let snippet = snip_body(bytes);
        tracing::trace!(
            req_id=%self.req_id,
            body_snippet=%snippet,
            "http.response.body_snippet"
        );

        if status.is_success() {
            return Ok(TextResponse {
                status,
                body: String::from_utf8_lossy(bytes).into_owned(),
            });
        }

        let message = extract_error_message(bytes);
        tracing::warn!(
            req_id=%self.req_id,
            %status,
            message=%message,
            x_request_id=%req_hdr_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id: req_hdr_id.to_string(),
        })
    }
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    let snippet = snip_body(body);
    if snippet.trim().is_empty() {
        "<empty body>".to_string()
    } else {
        snippet
    }
}

fn truncate_chars(s: &str, max: usize) -> std::borrow::Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]).into(),
        None => s.into(),
    }
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }
    Ok(s)
}
