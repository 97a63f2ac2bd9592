#![allow(clippy::too_many_arguments)]

pub mod client;
pub mod data;
pub mod structure;
pub mod urn;

// Re-export the ergonomic client and core types for easy access
pub use client::{Configuration, SdmxClient, SdmxError};
pub use data::SdmxObservation;
pub use structure::{LocalizedText, SdmxCode, SdmxCodelist, SdmxDimension, SdmxStructure};
pub use urn::DataflowRef;
