#![allow(clippy::too_many_arguments)]

pub mod client;
pub mod models;

// Re-export the ergonomic client and configuration for easy access
pub use client::{Configuration, PxClient, PxError};
pub use models::{PxQuery, PxQueryEntry, PxSelection, PxTableMetadata, PxVariable};
