pub mod error;
pub mod hardware;
pub mod query;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use error::{describe_transport_error, format_db_error, ClientError};
pub use query::Query;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            proxy: None,
            header: None,
        }
    }
}

/// One page of a list endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Paged {
        data: Vec<T>,
        #[serde(default)]
        total_count: Option<u64>,
    },
    Bare(Vec<T>),
}

impl<T> From<PageBody<T>> for Page<T> {
    fn from(body: PageBody<T>) -> Self {
        match body {
            PageBody::Paged { data, total_count } => {
                let total_count = total_count.map(|n| n as usize).unwrap_or(data.len());
                Page { data, total_count }
            }
            PageBody::Bare(data) => Page {
                total_count: data.len(),
                data,
            },
        }
    }
}

pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ClientError> {
    let invalid = || ClientError::InvalidHeader {
        header: raw.to_string(),
    };
    let (name, value) = raw.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

pub(crate) fn build_http_client(
    proxy: Option<&str>,
    header: Option<&str>,
    timeout_seconds: usize,
) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("floortrack/", env!("CARGO_PKG_VERSION"))),
    );
    if let Some(raw) = header.filter(|h| !h.trim().is_empty()) {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(30));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ClientError::HttpClientBuild { source: e })
}

pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|_| ClientError::InvalidUrl {
        url: raw.to_string(),
    })?;
    Ok(trimmed.to_string())
}

/// Typed access to the tracking backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&options.base_url)?;
        let http = build_http_client(
            options.proxy.as_deref(),
            options.header.as_deref(),
            options.timeout_seconds,
        )?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&Query>,
        body: Option<&B>,
    ) -> Result<serde_json::Value, ClientError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "api request");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ClientError::Transport {
            message: describe_transport_error(&e),
            source: e,
        })?;
        handle_api_response(path, response).await
    }

    pub async fn get_value(&self, path: &str, query: &Query) -> Result<serde_json::Value, ClientError> {
        self.send::<()>(Method::GET, path, Some(query), None).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T, ClientError> {
        let value = self.get_value(path, query).await?;
        decode(path, value)
    }

    pub async fn get_page<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<Page<T>, ClientError> {
        let body: PageBody<T> = self.get_json(path, query).await?;
        Ok(body.into())
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.send(Method::POST, path, None, Some(body)).await?;
        decode(path, value)
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.send(Method::PUT, path, None, Some(body)).await?;
        decode(path, value)
    }

    pub async fn delete_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let value = self.send(Method::DELETE, path, None, Some(body)).await?;
        decode(path, value)
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: serde_json::Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode {
        path: path.to_string(),
        source: e,
    })
}

/// Success bodies come back as JSON when they parse, otherwise as a JSON
/// string holding the raw text. Failures carry the mapped server message.
pub async fn handle_api_response(
    path: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, ClientError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| ClientError::Transport {
        message: describe_transport_error(&e),
        source: e,
    })?;
    interpret_body(path, status, &text)
}

pub(crate) fn interpret_body(
    path: &str,
    status: StatusCode,
    text: &str,
) -> Result<serde_json::Value, ClientError> {
    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        return Ok(serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_string())));
    }
    let raw = error::extract_error_message(text);
    let raw = if raw.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        raw
    };
    let message = format_db_error(&raw);
    warn!(path = path, status = status.as_u16(), message = %message, "api request failed");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
