//! High-level client for Swiss Federal Statistical Office datasets.
//!
//! Two structurally different upstream APIs sit behind one canonical
//! surface: the legacy tabular (PxWeb) API and the modern time-series
//! (SDMX) API. This crate owns the translation layer: endpoint
//! resolution with a process-wide cache, metadata normalization into
//! ordered [`Dimension`]s, simplified-filter query building, and
//! observation normalization.

pub use stats_px as px;
pub use stats_sdmx as sdmx;

pub mod cache;
pub mod client;
pub mod error;
pub mod model;
pub mod normalize;
pub mod query;

pub use cache::{EndpointCache, Purpose};
pub use client::{ObservationOptions, ObservationResult, StatsClient, StatsConfig};
pub use error::{Result, StatsError};
pub use model::{Backend, DatasetRef, Dimension, DimensionValue, Filter, FilterValue, Language, Observation};

/// Default base URL of the tabular (PxWeb) API.
pub const PX_BASE_URL: &str = "https://www.pxweb.bfs.admin.ch/api/v1";

/// Default base URL of the time-series (SDMX) API.
pub const SDMX_BASE_URL: &str = "https://sdmx.bfs.admin.ch/rest";
