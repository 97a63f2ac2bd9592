use crate::models::{PxQuery, PxTableMetadata};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the PxWeb client
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Base URL for the tabular API (e.g., "https://www.pxweb.bfs.admin.ch/api/v1")
    pub base_path: String,
    /// User agent string for HTTP requests
    pub user_agent: Option<String>,
    /// HTTP client instance
    pub client: reqwest::Client,
    /// Per-request timeout for metadata calls
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
            base_path: "https://www.pxweb.bfs.admin.ch/api/v1".to_owned(),
            user_agent: Some("swiss-stats-rs/1.0".to_owned()),
            client: reqwest::Client::new(),
            metadata_timeout: Duration::from_secs(10),
            data_timeout: Duration::from_secs(60),
        }
    }
}

/// # PxWeb Client
///
/// An ergonomic Rust client for PxWeb-style tabular statistics APIs,
/// as published by the Swiss Federal Statistical Office.
///
/// A table lives at `{base}/{language}/{table_id}/{table_id}.px`. A GET
/// on that path returns the table metadata (the `variables` array); a
/// POST with a query body returns the table data in the requested
/// response format.
///
/// ## Usage
///
/// ```rust,no_run
/// use stats_px::{PxClient, Configuration};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = PxClient::new(Arc::new(Configuration::default()));
///
///     let metadata = client.table_metadata("de", "px-x-0102020000_101").await?;
///     for variable in &metadata.variables {
///         println!("{}: {} values", variable.code, variable.values.len());
///     }
///     Ok(())
/// }
/// ```
pub struct PxClient {
    configuration: Arc<Configuration>,
}

impl std::fmt::Debug for PxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PxClient")
            .field("base_path", &self.configuration.base_path)
            .finish()
    }
}

/// Errors that can occur when interacting with the tabular API
#[derive(Debug)]
pub enum PxError {
    /// Network, HTTP, or other request-level errors
    ///
    /// This includes connection failures, timeouts, and DNS resolution
    /// issues.
    RequestError(Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing or deserialization errors
    ///
    /// Occurs when the upstream returns data that doesn't match the
    /// expected metadata schema or is not valid JSON.
    ParseError(serde_json::Error),

    /// Upstream API errors with status codes
    ApiError {
        /// HTTP status code from the upstream
        status: u16,
        /// Response body returned with the error status
        message: String,
    },
}

impl std::fmt::Display for PxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PxError::RequestError(e) => write!(f, "Request error: {}", e),
            PxError::ParseError(e) => write!(f, "Parse error: {}", e),
            PxError::ApiError { status, message } => {
                write!(f, "PxWeb API error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for PxError {}

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

/// Send a request, retrying transient statuses up to [`MAX_RETRIES`]
/// times, honoring the upstream's own requested delay.
async fn send_with_retry(builder: reqwest::RequestBuilder) -> Result<reqwest::Response, PxError> {
    let mut attempt = 0u32;
    loop {
        let request = builder.try_clone().ok_or_else(|| {
            PxError::RequestError("request body is not cloneable for retry".into())
        })?;
        let response = request
            .send()
            .await
            .map_err(|e| PxError::RequestError(Box::new(e)))?;

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

impl PxClient {
    /// Create a new PxWeb client instance
    pub fn new(configuration: Arc<Configuration>) -> Self {
        Self { configuration }
    }

    fn table_url(&self, language: &str, table_id: &str) -> String {
        format!(
            "{}/{}/{}/{}.px",
            self.configuration.base_path,
            urlencoding::encode(language),
            urlencoding::encode(table_id),
            urlencoding::encode(table_id)
        )
    }

    fn apply_user_agent(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.configuration.user_agent {
            Some(ua) => builder.header(reqwest::header::USER_AGENT, ua),
            None => builder,
        }
    }

    /// Fetch the metadata document for a table
    ///
    /// Returns the upstream's native `variables` structure: each
    /// variable carries a code, a localized text, and the ordered value
    /// codes with their ordered value texts.
    ///
    /// # Arguments
    ///
    /// * `language` - Language segment of the table path (e.g., "de")
    /// * `table_id` - Table identifier (e.g., "px-x-0102020000_101")
    pub async fn table_metadata(
        &self,
        language: &str,
        table_id: &str,
    ) -> Result<PxTableMetadata, PxError> {
        let url = self.table_url(language, table_id);

        let builder = self
            .apply_user_agent(self.configuration.client.get(&url))
            .timeout(self.configuration.metadata_timeout);

        let response = send_with_retry(builder).await?;

        if response.status().is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| PxError::RequestError(Box::new(e)))?;
            let metadata: PxTableMetadata =
                serde_json::from_str(&body).map_err(PxError::ParseError)?;
            Ok(metadata)
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(PxError::ApiError {
                status,
                message: error_text,
            })
        }
    }

    /// Fetch table data by POSTing a query to the table path
    ///
    /// The response body is passed through unmodified: the upstream's
    /// own statistical data format (e.g., JSON-stat2) is what the
    /// caller receives. JSON bodies are returned parsed; any other
    /// format (e.g., CSV) is returned as a string value.
    ///
    /// # Arguments
    ///
    /// * `language` - Language segment of the table path
    /// * `table_id` - Table identifier
    /// * `query` - Per-variable selection clauses plus response format
    pub async fn table_data(
        &self,
        language: &str,
        table_id: &str,
        query: &PxQuery,
    ) -> Result<Value, PxError> {
        let url = self.table_url(language, table_id);

        let builder = self
            .apply_user_agent(self.configuration.client.post(&url))
            .timeout(self.configuration.data_timeout)
            .json(query);

        let response = send_with_retry(builder).await?;

        if response.status().is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| PxError::RequestError(Box::new(e)))?;
            match serde_json::from_str::<Value>(&body) {
                Ok(value) => Ok(value),
                Err(_) => Ok(Value::String(body)),
            }
        } else {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(PxError::ApiError {
                status,
                message: error_text,
            })
        }
    }
}
