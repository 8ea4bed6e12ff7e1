// HTTP transport for the upstream OLT management API.
//
// Base path: configurable (e.g. https://tenant.smartolt.com/api/)
// Auth: X-Token header
//
// Returns every response in [200, 500) as a generic JSON value. 4xx
// bodies are data, not errors: the upstream explains rejections and
// throttling in the body, and callers need that text.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::params::Params;
use crate::transport::TransportConfig;

const TOKEN_HEADER: &str = "X-Token";

/// A response the upstream actually answered, status in `[200, 500)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status_code: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }
}

/// What to send with a request.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    None,
    /// Appended as a query string (GET).
    Query(&'a Params),
    /// Sent as an `application/x-www-form-urlencoded` body. The upstream
    /// rejects JSON bodies on mutations.
    Form(&'a Params),
}

/// Async transport for the upstream API.
///
/// Holds a `reqwest::Client` with the token header pre-installed and the
/// normalized base URL. Cheap to share behind an `Arc`.
pub struct UpstreamTransport {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl UpstreamTransport {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, static token, and transport config.
    ///
    /// Injects `X-Token` as a sensitive default header on every request.
    pub fn from_token(
        base_url: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        token_value.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: 0,
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join an endpoint path (e.g. `"/onu/get_onus_statuses"`) onto the base.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Calls ────────────────────────────────────────────────────────

    /// Issue one HTTP call.
    ///
    /// `Ok` for any status in `[200, 500)`. 5xx becomes
    /// [`Error::Server`]; network failures and timeouts are errors too.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Payload<'_>,
    ) -> Result<RawResponse, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        let builder = self.http.request(method, url);
        let builder = match payload {
            Payload::None => builder,
            Payload::Query(params) => builder.query(params),
            Payload::Form(params) => builder.form(params),
        };

        let resp = builder.send().await.map_err(|e| self.map_send_error(e))?;
        self.handle_response(resp).await
    }

    /// GET with query parameters.
    pub async fn get(&self, path: &str, params: &Params) -> Result<RawResponse, Error> {
        let payload = if params.is_empty() {
            Payload::None
        } else {
            Payload::Query(params)
        };
        self.call(Method::GET, path, payload).await
    }

    /// POST with a form-urlencoded body.
    pub async fn post_form(&self, path: &str, params: &Params) -> Result<RawResponse, Error> {
        self.call(Method::POST, path, Payload::Form(params)).await
    }

    // ── Response handling ────────────────────────────────────────────

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<RawResponse, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        trace!(status = status.as_u16(), bytes = body.len(), "upstream response");

        if status.is_server_error() {
            return Err(Error::Server {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let parsed = if body.trim().is_empty() {
            // A 2xx with nothing in it carries neither data nor a reason.
            if !status.is_client_error() {
                return Err(Error::Deserialization {
                    message: format!("empty response body (HTTP {})", status.as_u16()),
                    body,
                });
            }
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&body) {
                Ok(v) => v,
                // A 4xx page that isn't JSON is still the upstream's answer.
                Err(_) if status.is_client_error() => Value::String(body),
                Err(e) => {
                    let preview = preview(&body);
                    return Err(Error::Deserialization {
                        message: format!("{e} (body preview: {preview:?})"),
                        body,
                    });
                }
            }
        };

        Ok(RawResponse {
            status_code: status.as_u16(),
            body: parsed,
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
