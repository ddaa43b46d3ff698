use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use studyspark_core::RetryPolicy;
use tracing::{debug, info};
use uuid::Uuid;

use super::errors::RequestError;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Cookie jar that can be emptied in place, which `reqwest::cookie::Jar`
/// alone cannot do once it is wired into a client. It also keeps every live
/// `Set-Cookie` line with its attributes so the session can be persisted.
#[derive(Default)]
pub(crate) struct SessionJar {
    inner: RwLock<Jar>,
    received: RwLock<BTreeMap<String, String>>,
}

impl SessionJar {
    fn add(&self, set_cookie: &str, url: &Url) {
        self.record(set_cookie);
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .add_cookie_str(set_cookie, url);
    }

    fn record(&self, set_cookie: &str) {
        let Some(line) = SetCookieLine::parse(set_cookie, Utc::now()) else {
            return;
        };
        let mut received = self.received.write().unwrap_or_else(PoisonError::into_inner);
        if line.removed {
            received.remove(&line.key);
        } else {
            received.insert(line.key, set_cookie.trim().to_string());
        }
    }

    fn received(&self) -> Vec<String> {
        self.received
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
        self.received
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let headers: Vec<&HeaderValue> = cookie_headers.collect();
        for header in &headers {
            if let Ok(set_cookie) = header.to_str() {
                self.record(set_cookie);
            }
        }
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(&mut headers.into_iter(), url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}

/// Identity of one `Set-Cookie` line: a cookie is replaced by a later line
/// with the same name and path.
#[derive(Debug, PartialEq, Eq)]
struct SetCookieLine {
    key: String,
    removed: bool,
}

impl SetCookieLine {
    fn parse(set_cookie: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = set_cookie.split(';');
        let (name, _) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut path = "";
        let mut removed = false;
        for attribute in parts {
            let (key, value) = attribute.split_once('=').unwrap_or((attribute, ""));
            let (key, value) = (key.trim(), value.trim());
            if key.eq_ignore_ascii_case("path") {
                path = value;
            } else if key.eq_ignore_ascii_case("max-age") {
                removed |= value.parse::<i64>().is_ok_and(|secs| secs <= 0);
            } else if key.eq_ignore_ascii_case("expires") {
                removed |= DateTime::parse_from_rfc2822(value)
                    .is_ok_and(|at| at.with_timezone(&Utc) <= now);
            }
        }
        Some(Self {
            key: format!("{name};{path}"),
            removed,
        })
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ApiClientOptions {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub allow_invalid_certs: bool,
}

impl Default for ApiClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            allow_invalid_certs: false,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug)]
pub(crate) struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// JSON client bound to one backend origin, with cookie session and retry.
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    cookies: Arc<SessionJar>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(api_url: &str, options: ApiClientOptions) -> Result<Self, RequestError> {
        let base_url = Url::parse(api_url.trim())
            .map_err(|err| RequestError::InvalidUrl(format!("{api_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RequestError::InvalidUrl(api_url.to_string()));
        }
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let cookies = Arc::new(SessionJar::default());
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("studyspark-cli/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&cookies))
            .danger_accept_invalid_certs(options.allow_invalid_certs)
            .build()
            .map_err(RequestError::Build)?;
        Ok(Self {
            client,
            base_url,
            cookies,
            retry: options.retry,
            timeout: options.timeout,
        })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, RequestError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|err| RequestError::InvalidUrl(format!("{joined}: {err}")))
    }

    /// Live `Set-Cookie` lines, attributes included, for persistence.
    pub fn session_cookies(&self) -> Vec<String> {
        self.cookies.received()
    }

    /// Replays persisted `Set-Cookie` lines against the backend origin.
    pub fn restore_cookies(&self, set_cookies: &[String]) {
        for set_cookie in set_cookies {
            self.cookies.add(set_cookie, &self.base_url);
        }
        if !set_cookies.is_empty() {
            debug!(count = set_cookies.len(), "restored session cookies");
        }
    }

    pub fn clear_cookies(&self) {
        self.cookies.clear();
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, RequestError> {
        let body = serde_json::to_value(body)?;
        self.send(ApiRequest::post(path).with_json(body)).await
    }

    /// Sends `request`, retrying per the client's policy. Only the final
    /// attempt's error is returned.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
        let url = self.url_for(&request.path)?;
        let request_id = Uuid::now_v7().to_string();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.send_once(&request, &url, &request_id, attempt).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            let Some(kind) = err.failure_kind() else {
                return Err(err);
            };
            if !self
                .retry
                .should_retry(request.method.as_str(), kind, attempt)
            {
                return Err(err);
            }
            let delay = self.retry.jittered_delay(attempt, &mut rand::thread_rng());
            info!(
                method = %request.method,
                url = %url,
                request_id = %request_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying http request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        url: &Url,
        request_id: &str,
        attempt: u32,
    ) -> Result<ApiResponse, RequestError> {
        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .timeout(self.timeout)
            .headers(request.headers.clone())
            .header(REQUEST_ID_HEADER, request_id);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        debug!(method = %request.method, url = %url, attempt, "http request");
        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|err| RequestError::from_transport(err, attempt))?;
        let status = response.status();
        debug!(
            method = %request.method,
            url = %url,
            attempt,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "http response"
        );
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RequestError::from_body(err, status.as_u16(), attempt))?;
        let body = decode_body(&bytes);
        if !status.is_success() {
            return Err(RequestError::from_status(status.as_u16(), body, attempt));
        }
        Ok(ApiResponse { status, body })
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).trim().to_string()))
}
