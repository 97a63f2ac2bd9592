use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use stats_px::{Configuration as PxConfiguration, PxClient};
use stats_sdmx::{Configuration as SdmxConfiguration, DataflowRef, SdmxClient};

use crate::cache::{EndpointCache, Purpose};
use crate::error::{Result, StatsError};
use crate::model::{Backend, DatasetRef, Dimension, Filter};
use crate::normalize;
use crate::query;
use crate::{PX_BASE_URL, SDMX_BASE_URL};

/// Configuration for the statistics client
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Base URL of the tabular (PxWeb) API
    pub px_base_url: String,
    /// Base URL of the time-series (SDMX) API
    pub sdmx_base_url: String,
    /// User agent for HTTP requests
    pub user_agent: String,
    /// Timeout for discovery and metadata calls in seconds
    pub metadata_timeout_secs: u64,
    /// Timeout for data calls in seconds
    pub data_timeout_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            px_base_url: PX_BASE_URL.to_string(),
            sdmx_base_url: SDMX_BASE_URL.to_string(),
            user_agent: "swiss-stats-rs/1.0".to_string(),
            metadata_timeout_secs: 10,
            data_timeout_secs: 60,
        }
    }
}

impl StatsConfig {
    /// Create a new configuration with the published default endpoints
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the tabular backend at a different base URL
    pub fn with_px_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.px_base_url = url.into();
        self
    }

    /// Point the time-series backend at a different base URL
    pub fn with_sdmx_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.sdmx_base_url = url.into();
        self
    }

    /// Set custom user agent
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the metadata/discovery timeout
    pub fn with_metadata_timeout(mut self, timeout_secs: u64) -> Self {
        self.metadata_timeout_secs = timeout_secs;
        self
    }

    /// Set the data timeout
    pub fn with_data_timeout(mut self, timeout_secs: u64) -> Self {
        self.data_timeout_secs = timeout_secs;
        self
    }
}

/// Per-request options for an observation fetch.
#[derive(Debug, Clone, Default)]
pub struct ObservationOptions {
    /// Tabular response format, passed through to the upstream
    /// (defaults to `json-stat2`)
    pub format: Option<String>,
    /// Inclusive start of the time range (time-series backend only)
    pub start_period: Option<String>,
    /// Inclusive end of the time range (time-series backend only)
    pub end_period: Option<String>,
}

/// Observation fetch result, shaped per backend.
///
/// The tabular upstream already answers in a standard statistical data
/// format, so that body is passed through untouched; the time-series
/// backend's XML is normalized into flat observation records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObservationResult {
    /// Tabular response body, unmodified
    Passthrough(Value),
    /// Normalized time-series observations
    Observations(Vec<crate::model::Observation>),
}

/// High-level client for Swiss statistical datasets
///
/// Wraps the two backend clients behind one capability set — resolve
/// endpoint, fetch metadata, build query, fetch observations — with the
/// variant selected by [`DatasetRef::backend`].
///
/// # Examples
///
/// ```rust,no_run
/// use swiss_stats::{Backend, DatasetRef, StatsClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StatsClient::new()?;
/// let dataset = DatasetRef::new("DF_POPULATION", Backend::Timeseries, "de")?;
///
/// let dimensions = client.dimensions(&dataset).await?;
/// for dimension in &dimensions {
///     println!("{} ({} values)", dimension.label, dimension.values.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StatsClient {
    px: PxClient,
    sdmx: SdmxClient,
    cache: EndpointCache,
}

impl StatsClient {
    /// Create a client against the published default endpoints, with a
    /// fresh endpoint cache
    pub fn new() -> Result<Self> {
        Self::with_config(StatsConfig::new())
    }

    /// Create a client with custom configuration and a fresh endpoint
    /// cache
    pub fn with_config(config: StatsConfig) -> Result<Self> {
        Self::with_cache(config, EndpointCache::new())
    }

    /// Create a client with custom configuration and an explicitly
    /// injected endpoint cache
    pub fn with_cache(config: StatsConfig, cache: EndpointCache) -> Result<Self> {
        for base in [&config.px_base_url, &config.sdmx_base_url] {
            Url::parse(base).map_err(|e| {
                StatsError::validation(format!("invalid base URL '{base}': {e}"))
            })?;
        }

        let metadata_timeout = Duration::from_secs(config.metadata_timeout_secs);
        let data_timeout = Duration::from_secs(config.data_timeout_secs);

        let px = PxClient::new(Arc::new(PxConfiguration {
            base_path: config.px_base_url.trim_end_matches('/').to_string(),
            user_agent: Some(config.user_agent.clone()),
            client: reqwest::Client::new(),
            metadata_timeout,
            data_timeout,
        }));

        let sdmx = SdmxClient::new(Arc::new(SdmxConfiguration {
            base_path: config.sdmx_base_url.trim_end_matches('/').to_string(),
            user_agent: Some(config.user_agent),
            client: reqwest::Client::new(),
            metadata_timeout,
            data_timeout,
        }));

        Ok(Self { px, sdmx, cache })
    }

    // === Endpoint resolution ===

    /// Resolve the endpoint serving a time-series dataset for the
    /// given purpose.
    ///
    /// A cache miss triggers one discovery call listing every declared
    /// dataflow; the first entry whose id equals the requested
    /// identifier wins. Upstream uniqueness across agencies and
    /// versions is unverified, so duplicate ids resolve to whichever
    /// entry the upstream declared first — a known ambiguity, kept
    /// deliberately. Both purposes are cached from the same discovery
    /// call.
    async fn resolve(&self, dataset_id: &str, purpose: Purpose) -> Result<String> {
        if let Some(url) = self.cache.get(dataset_id, purpose) {
            return Ok(url);
        }

        let flows = self.sdmx.dataflows().await?;
        let flow: &DataflowRef = flows
            .iter()
            .find(|flow| flow.id == dataset_id)
            .ok_or_else(|| {
                StatsError::not_found(format!(
                    "no declared dataflow matches dataset '{dataset_id}'"
                ))
            })?;

        let base = self.sdmx.base_path();
        let metadata_url =
            self.cache
                .insert_if_absent(dataset_id, Purpose::Metadata, flow.structure_url(base));
        let data_url =
            self.cache
                .insert_if_absent(dataset_id, Purpose::Data, flow.series_url(base));

        Ok(match purpose {
            Purpose::Metadata => metadata_url,
            Purpose::Data => data_url,
        })
    }

    // === Canonical operations ===

    /// Fetch the canonical dimension list of a dataset
    pub async fn dimensions(&self, dataset: &DatasetRef) -> Result<Vec<Dimension>> {
        match dataset.backend {
            Backend::Tabular => {
                let metadata = self
                    .px
                    .table_metadata(dataset.language.as_str(), &dataset.id)
                    .await?;
                Ok(normalize::dimensions_from_px(&metadata))
            }
            Backend::Timeseries => {
                let url = self.resolve(&dataset.id, Purpose::Metadata).await?;
                let structure = self.sdmx.structure(&url).await?;
                Ok(normalize::dimensions_from_structure(
                    &structure,
                    dataset.language,
                ))
            }
        }
    }

    /// Fetch observations for a dataset, optionally filtered
    ///
    /// The query is built from the dataset's own canonical dimensions:
    /// metadata is always fetched first, since both backends shape
    /// their data requests from the declared dimension structure.
    pub async fn observations(
        &self,
        dataset: &DatasetRef,
        filter: Option<&Filter>,
        options: &ObservationOptions,
    ) -> Result<ObservationResult> {
        let dimensions = self.dimensions(dataset).await?;

        match dataset.backend {
            Backend::Tabular => {
                let format = options.format.as_deref().unwrap_or("json-stat2");
                let px_query = query::build_px_query(&dimensions, filter, format);
                let body = self
                    .px
                    .table_data(dataset.language.as_str(), &dataset.id, &px_query)
                    .await?;
                Ok(ObservationResult::Passthrough(body))
            }
            Backend::Timeseries => {
                let key = query::build_sdmx_key(&dimensions, filter);
                let series_url = self.resolve(&dataset.id, Purpose::Data).await?;
                let raw = self
                    .sdmx
                    .data(
                        &series_url,
                        &key,
                        options.start_period.as_deref(),
                        options.end_period.as_deref(),
                    )
                    .await?;
                Ok(ObservationResult::Observations(
                    normalize::observations_from_sdmx(&raw, &dimensions),
                ))
            }
        }
    }

    /// The injected endpoint cache, exposed for inspection
    pub fn endpoint_cache(&self) -> &EndpointCache {
        &self.cache
    }
}
