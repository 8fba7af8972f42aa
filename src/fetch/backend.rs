use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::query::QueryKey;

pub const TOP_LANDLORDS_PATH: &str = "api/landlords/top/";

/// One backend record. The shape is owned by the API; the table only reads
/// fields by name and uses `id` as the row identity.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn display(&self, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchResult {
    pub rows: Vec<Row>,
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
struct TopLandlordsResponse {
    #[serde(default)]
    landlords: Vec<Row>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum BackendSetupError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Source of ranked pages. Futures are polled on a single thread, so
/// implementations need not be `Send`.
#[async_trait(?Send)]
pub trait Backend {
    async fn fetch_page(&self, key: &QueryKey) -> Result<FetchResult, TransportError>;
}

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBackend {
    pub fn new(options: &HttpOptions) -> Result<Self, BackendSetupError> {
        let endpoint = endpoint_url(&options.base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let invalid = || BackendSetupError::InvalidHeader {
                header: raw.to_string(),
            };
            let (name, value) = crate::utils::parse_header(raw).ok_or_else(invalid)?;
            let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid())?;
            let value = reqwest::header::HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(options.timeout_seconds));

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| BackendSetupError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy_cfg);
        }

        let client = builder
            .build()
            .map_err(|e| BackendSetupError::HttpClientBuild { source: e })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn fetch_page(&self, key: &QueryKey) -> Result<FetchResult, TransportError> {
        let url = request_url(&self.endpoint, key);
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            source: e,
        })?;
        decode_page(&body).map_err(|e| TransportError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

pub fn endpoint_url(base_url: &str) -> Result<Url, BackendSetupError> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base)
        .and_then(|u| u.join(TOP_LANDLORDS_PATH))
        .map_err(|e| BackendSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })
}

/// Page numbers are 1-based on the wire; sort and keyword are omitted when unset.
pub fn request_url(endpoint: &Url, key: &QueryKey) -> Url {
    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.append_pair("pageNumber", &key.page_number().to_string());
        pairs.append_pair("pageSize", &key.page_size.to_string());
        if let Some(sort) = key.sort.as_ref() {
            pairs.append_pair("sortBy", &sort.column_key);
            pairs.append_pair("sortDirection", sort.direction.as_str());
        }
        if !key.filter_text.is_empty() {
            pairs.append_pair("keyword", &key.filter_text);
        }
    }
    url
}

pub fn decode_page(body: &str) -> Result<FetchResult, serde_json::Error> {
    let parsed: TopLandlordsResponse = serde_json::from_str(body)?;
    Ok(FetchResult {
        rows: parsed.landlords,
        total_count: parsed.total_results,
    })
}
