use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Publication language of a dataset. The statistics office publishes
/// in exactly these four languages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    Fr,
    It,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::Fr => "fr",
            Language::It => "it",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "de" => Ok(Language::De),
            "fr" => Ok(Language::Fr),
            "it" => Ok(Language::It),
            "en" => Ok(Language::En),
            other => Err(StatsError::validation(format!(
                "unsupported language '{other}', expected one of de, fr, it, en"
            ))),
        }
    }
}

/// Which upstream API serves a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Legacy tabular (PxWeb) API
    Tabular,
    /// Modern time-series (SDMX) API
    Timeseries,
}

/// Identifies one dataset for the lifetime of a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetRef {
    pub id: String,
    pub backend: Backend,
    pub language: Language,
}

impl DatasetRef {
    /// Build a dataset reference, validating the caller input before
    /// any network call is made.
    pub fn new(id: &str, backend: Backend, language: &str) -> Result<Self, StatsError> {
        if id.trim().is_empty() {
            return Err(StatsError::validation("dataset identifier must not be empty"));
        }
        Ok(Self {
            id: id.to_string(),
            backend,
            language: language.parse()?,
        })
    }
}

/// One permitted value of a dimension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub code: String,
    pub label: String,
}

/// Canonical filterable axis of a dataset, independent of the upstream
/// backend that declared it.
///
/// `position` is the upstream's declared ordinal and is significant:
/// the time-series backend encodes filters as a dot-delimited path
/// string in position order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub code: String,
    pub label: String,
    #[serde(rename = "isTimeDimension")]
    pub is_time: bool,
    pub position: i32,
    /// Ordered `(code, label)` pairs in the upstream's declared order.
    pub values: Vec<DimensionValue>,
}

/// One data point: dimension codes mapped to resolved values, plus a
/// single nullable measure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    #[serde(flatten)]
    pub dimensions: BTreeMap<String, String>,
    pub value: Option<f64>,
}

/// Selected value codes for one dimension: a bare scalar is treated as
/// a one-element selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// The selection as a value-code list, scalar coerced to a
    /// one-element sequence.
    pub fn to_codes(&self) -> Vec<String> {
        match self {
            FilterValue::One(code) => vec![code.clone()],
            FilterValue::Many(codes) => codes.clone(),
        }
    }
}

/// Simplified filter: dimension code to one-or-many selected value
/// codes. `None` at the call site means "select everything".
pub type Filter = HashMap<String, FilterValue>;
