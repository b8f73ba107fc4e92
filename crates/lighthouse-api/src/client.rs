// Control API HTTP client
//
// Wraps `reqwest::Client` with URL construction under the API prefix and
// the uniform response contract: non-2xx becomes `Error::Api` with the
// server's `detail`/`message`, and an empty or unparseable 2xx body is a
// successful `None`. Endpoint methods live in sibling modules as inherent
// impls so this file stays focused on transport mechanics.

use bytes::Bytes;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const JSON: &str = "application/json";

/// Raw binary response (settings backup download).
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Bytes,
    /// Filename advertised by `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// HTTP client for the dashboard control API.
///
/// `base_url` includes the API prefix (e.g. `http://host:8000/api`); every
/// endpoint path is appended to it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API base URL (prefix included).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating stray slashes on either side.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, Error> {
        self.send(Method::GET, url, None::<&()>).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Option<T>, Error> {
        self.send(Method::POST, url, Some(body)).await
    }

    /// POST without a request body (action endpoints like `check-update`).
    pub(crate) async fn post_empty<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, Error> {
        self.send(Method::POST, url, None::<&()>).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, Error> {
        self.send(Method::DELETE, url, None::<&()>).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<Option<T>, Error> {
        debug!("{} {}", method, url);

        let mut builder = self.http.request(method, url).header(CONTENT_TYPE, JSON);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await.map_err(Error::Transport)?;

        parse_response(resp).await
    }

    /// POST a JSON body and return the raw response bytes.
    pub(crate) async fn download(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Download, Error> {
        debug!("POST {} (download)", url);

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let headers = resp.headers();
        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = resp.bytes().await.map_err(Error::Transport)?;

        Ok(Download {
            bytes,
            filename,
            content_type,
        })
    }
}

// ── Response parsing ─────────────────────────────────────────────────

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Option<T>, Error> {
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(api_error(status, &body));
    }

    let body = resp.text().await.map_err(Error::Transport)?;
    Ok(decode_body(&body))
}

/// Decode a successful body. Empty, non-JSON, `null` and wrong-shaped
/// bodies are all a success with no payload.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Option<T> {
    if body.trim().is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "response body is not JSON, treating as empty");
            return None;
        }
    };
    if value.is_null() {
        return None;
    }

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            let preview = body.chars().take(200).collect::<String>();
            warn!(error = %e, body = %preview, "unexpected response shape, treating as empty");
            None
        }
    }
}

fn api_error(status: StatusCode, body: &str) -> Error {
    Error::Api {
        status: status.as_u16(),
        message: error_message(status, body),
    }
}

/// Pick the user-facing message for a failed request: `detail`, then
/// `message`, then the status reason, then a generic fallback.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(body_message)
        .or_else(|| status.canonical_reason().map(String::from))
        .unwrap_or_else(|| "Request failed".to_owned())
}

fn body_message(value: &Value) -> Option<String> {
    ["detail", "message"]
        .iter()
        .find_map(|key| match value.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            // Validation error lists: [{"loc": [...], "msg": "..."}]
            Value::Array(items) => {
                let msgs: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!msgs.is_empty()).then(|| msgs.join("; "))
            }
            _ => None,
        })
}

/// Extract a filename from a `Content-Disposition` header value.
///
/// Prefers the RFC 5987 `filename*=UTF-8''...` form, then `filename=`.
pub(crate) fn filename_from_disposition(header: &str) -> Option<String> {
    let params: Vec<(&str, &str)> = header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let extended = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("filename*"))
        .and_then(|(_, v)| {
            let encoded = v.split_once("''").map_or(*v, |(_, rest)| rest);
            urlencoding::decode(encoded.trim_matches('"'))
                .ok()
                .map(|s| s.into_owned())
        });

    extended
        .or_else(|| {
            params
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("filename"))
                .map(|(_, v)| v.trim_matches('"').to_owned())
        })
        .filter(|name| !name.is_empty())
}
