use crate::data::{SdmxObservation, parse_generic_data};
use crate::structure::{SdmxStructure, parse_structure};
use crate::urn::DataflowRef;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the SDMX client
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL for the SDMX REST API (e.g., "https://sdmx.bfs.admin.ch/rest")
    pub base_path: String,
    /// User agent string for HTTP requests
    pub user_agent: Option<String>,
    /// HTTP client instance
    pub client: reqwest::Client,
    /// Per-request timeout for discovery and metadata calls
    pub metadata_timeout: Duration,
    /// Per-request timeout for data calls
    pub data_timeout: Duration,
}

impl Configuration {
    /// Create a new configuration with default values
    pub fn new() -> Configuration {
        Configuration::default()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            base_path: "https://sdmx.bfs.admin.ch/rest".to_owned(),
            user_agent: Some("swiss-stats-rs/1.0".to_owned()),
            client: reqwest::Client::new(),
            metadata_timeout: Duration::from_secs(10),
            data_timeout: Duration::from_secs(60),
        }
    }
}

/// # SDMX Client
///
/// An ergonomic Rust client for SDMX REST time-series APIs.
///
/// Three call families:
///
/// - **Discovery**: `dataflows` lists every dataflow the backend
///   declares, parsed from the URN-keyed `references` of the JSON
///   dataflow document.
/// - **Structure**: `structure` fetches and parses an SDMX-Structure
///   XML document (dimension list plus codelists).
/// - **Data**: `data` fetches a generic-data XML document for a series
///   URL, key segment and optional time range.
pub struct SdmxClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for SdmxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdmxClient")
            .field("base_path", &self.configuration.base_path)
            .finish()
    }
}

/// Errors that can occur when interacting with the SDMX API
#[derive(Debug)]
pub enum SdmxError {
    /// Network, HTTP, or other request-level errors
    RequestError(Box<dyn std::error::Error + Send + Sync>),

    /// XML or JSON payloads that fail to parse into the expected shape
    ParseError(String),

    /// Upstream API errors with status codes
    ApiError {
        /// HTTP status code from the upstream
        status: u16,
        /// Response body returned with the error status
        message: String,
    },

    /// The data endpoint reported no observations for the given query.
    ///
    /// Distinguished from [`SdmxError::ApiError`] so callers can treat
    /// an empty result differently from a broken upstream.
    NoRecords,
}

impl std::fmt::Display for SdmxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdmxError::RequestError(e) => write!(f, "Request error: {}", e),
            SdmxError::ParseError(e) => write!(f, "Parse error: {}", e),
            SdmxError::ApiError { status, message } => {
                write!(f, "SDMX API error ({}): {}", status, message)
            }
            SdmxError::NoRecords => write!(f, "No records found for the given query"),
        }
    }
}

impl std::error::Error for SdmxError {}

/// Transient statuses eligible for a bounded retry. Everything else
/// fails immediately.
fn is_retryable(status: u16) -> bool {
    matches!(status, 408 | 413 | 429) || (500..600).contains(&status)
}

/// Delay requested by the upstream via `Retry-After` (delta-seconds
/// form). Absent or unparsable headers mean no delay.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

const MAX_RETRIES: u32 = 2;

async fn send_with_retry(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, SdmxError> {
    let mut attempt = 0u32;
    loop {
        let request = builder.try_clone().ok_or_else(|| {
            SdmxError::RequestError("request is not cloneable for retry".into())
        })?;
        let response = request
            .send()
            .await
            .map_err(|e| SdmxError::RequestError(Box::new(e)))?;

        let status = response.status().as_u16();
        if !is_retryable(status) || attempt >= MAX_RETRIES {
            return Ok(response);
        }

        if let Some(delay) = retry_after(&response) {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}

/// JSON wrapper of the dataflow discovery document. Only the URN keys
/// of `references` matter; the entry bodies are ignored.
#[derive(Debug, Deserialize)]
struct DataflowDocument {
    #[serde(default)]
    references: serde_json::Map<String, serde_json::Value>,
}

impl SdmxClient {
    /// Create a new SDMX client instance
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    /// Base URL this client talks to.
    pub fn base_path(&self) -> &str {
        &self.configuration.base_path
    }

    fn apply_user_agent(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.configuration.user_agent {
            Some(ua) => builder.header(reqwest::header::USER_AGENT, ua),
            None => builder,
        }
    }

    async fn fetch_text(
        &self,
        url: &str,
        accept: &str,
        timeout: Duration,
    ) -> Result<String, SdmxError> {
        let builder = self
            .apply_user_agent(self.configuration.client.get(url))
            .header(reqwest::header::ACCEPT, accept)
            .timeout(timeout);

        let response = send_with_retry(builder).await?;

        if response.status().is_success() {
            response
                .text()
                .await
                .map_err(|e| SdmxError::RequestError(Box::new(e)))
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(SdmxError::ApiError {
                status,
                message: error_text,
            })
        }
    }

    /// List every dataflow the backend declares
    ///
    /// A single call against `{base}/dataflow`; each `references` key
    /// is parsed as a `AGENCY:ID(VERSION)` URN. Keys that do not match
    /// the fixed shape are skipped.
    pub async fn dataflows(&self) -> Result<Vec<DataflowRef>, SdmxError> {
        let url = format!("{}/dataflow", self.configuration.base_path);
        let body = self
            .fetch_text(&url, "application/json", self.configuration.metadata_timeout)
            .await?;

        let document: DataflowDocument =
            serde_json::from_str(&body).map_err(|e| SdmxError::ParseError(e.to_string()))?;

        Ok(document
            .references
            .keys()
            .filter_map(|urn| DataflowRef::parse_urn(urn))
            .collect())
    }

    /// Fetch and parse an SDMX-Structure document from an absolute URL
    ///
    /// The URL is typically composed via [`DataflowRef::structure_url`]
    /// and carried through an endpoint cache by the caller.
    pub async fn structure(&self, url: &str) -> Result<SdmxStructure, SdmxError> {
        let body = self
            .fetch_text(url, "application/xml", self.configuration.metadata_timeout)
            .await?;
        parse_structure(&body).map_err(|e| SdmxError::ParseError(e.to_string()))
    }

    /// Fetch and parse a generic-data document
    ///
    /// `series_url` identifies the series (see
    /// [`DataflowRef::series_url`]); `key` is the positional path
    /// segment; the time range rides as separate query parameters and
    /// is omitted when not supplied. An upstream 404 is reported as
    /// [`SdmxError::NoRecords`], the upstream's signal that the query
    /// matched no observations.
    pub async fn data(
        &self,
        series_url: &str,
        key: &str,
        start_period: Option<&str>,
        end_period: Option<&str>,
    ) -> Result<Vec<SdmxObservation>, SdmxError> {
        // The key segment stays literal: `.` and `+` are structural in
        // the SDMX path grammar and must not be percent-encoded.
        let mut url = format!("{}/{}?dimensionAtObservation=AllDimensions", series_url, key);
        if let Some(start) = start_period {
            url.push_str(&format!("&startPeriod={}", urlencoding::encode(start)));
        }
        if let Some(end) = end_period {
            url.push_str(&format!("&endPeriod={}", urlencoding::encode(end)));
        }

        let builder = self
            .apply_user_agent(self.configuration.client.get(&url))
            .header(reqwest::header::ACCEPT, "application/xml")
            .timeout(self.configuration.data_timeout);

        let response = send_with_retry(builder).await?;

        if response.status().as_u16() == 404 {
            return Err(SdmxError::NoRecords);
        }

        if response.status().is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| SdmxError::RequestError(Box::new(e)))?;
            parse_generic_data(&body).map_err(|e| SdmxError::ParseError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(SdmxError::ApiError {
                status,
                message: error_text,
            })
        }
    }
}
