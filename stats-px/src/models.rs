use serde::{Deserialize, Serialize};

/// Metadata document returned for a single PxWeb table.
///
/// The upstream shape is already close to a canonical dimension list:
/// each entry in `variables` carries a code, a display text, the
/// ordered value codes and their ordered display texts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxTableMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub variables: Vec<PxVariable>,
}

/// One filterable variable (axis) of a PxWeb table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxVariable {
    pub code: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, rename = "valueTexts")]
    pub value_texts: Vec<String>,
    /// Marks the time axis of the table.
    #[serde(default)]
    pub time: bool,
    /// Upstream flag: the variable may be eliminated (aggregated away)
    /// when omitted from a query.
    #[serde(default)]
    pub elimination: bool,
}

/// Query payload POSTed back to the table endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxQuery {
    pub query: Vec<PxQueryEntry>,
    pub response: PxResponse,
}

/// Selection for a single variable within a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxQueryEntry {
    pub code: String,
    pub selection: PxSelection,
}

/// Selection clause: `filter` is either the `all` wildcard or `item`
/// with an explicit value-code list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxSelection {
    pub filter: String,
    pub values: Vec<String>,
}

impl PxSelection {
    /// Wildcard selection covering every value of the variable.
    pub fn all() -> Self {
        Self {
            filter: "all".to_string(),
            values: vec!["*".to_string()],
        }
    }

    /// Explicit selection of the given value codes.
    pub fn items(values: Vec<String>) -> Self {
        Self {
            filter: "item".to_string(),
            values,
        }
    }
}

/// Requested response format, passed through to the upstream verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PxResponse {
    pub format: String,
}

impl Default for PxResponse {
    fn default() -> Self {
        Self {
            format: "json-stat2".to_string(),
        }
    }
}
