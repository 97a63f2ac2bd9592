use regex::Regex;
use std::sync::OnceLock;

/// Structured dataflow identifier extracted from an upstream URN.
///
/// Discovery responses key their `references` entries with URNs of the
/// form `urn:sdmx:...Dataflow=AGENCY:ID(VERSION)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataflowRef {
    pub agency: String,
    pub id: String,
    pub version: String,
}

fn urn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Dataflow=([^:()]+):([^:()]+)\(([^()]+)\)")
            .expect("dataflow URN pattern is a valid regex")
    })
}

impl DataflowRef {
    /// Parse a dataflow URN, returning `None` for keys that do not
    /// match the fixed `AGENCY:ID(VERSION)` shape.
    pub fn parse_urn(urn: &str) -> Option<DataflowRef> {
        let captures = urn_pattern().captures(urn)?;
        Some(DataflowRef {
            agency: captures.get(1)?.as_str().to_string(),
            id: captures.get(2)?.as_str().to_string(),
            version: captures.get(3)?.as_str().to_string(),
        })
    }

    /// Structure-metadata URL for this dataflow, requesting transitive
    /// structural references (data structure, codelists, concepts).
    pub fn structure_url(&self, base: &str) -> String {
        format!(
            "{}/dataflow/{}/{}/{}?references=all",
            base,
            urlencoding::encode(&self.agency),
            urlencoding::encode(&self.id),
            urlencoding::encode(&self.version)
        )
    }

    /// Data-series URL for this dataflow. Identifies the series only;
    /// the key segment and time-range parameters are appended by the
    /// data fetch.
    pub fn series_url(&self, base: &str) -> String {
        format!(
            "{}/data/{},{},{}",
            base,
            urlencoding::encode(&self.agency),
            urlencoding::encode(&self.id),
            urlencoding::encode(&self.version)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_sdmx_urn() {
        let urn = "urn:sdmx:org.sdmx.infomodel.datastructure.Dataflow=BFS:DF_TEST_1(1.0)";
        let parsed = DataflowRef::parse_urn(urn).expect("urn should parse");
        assert_eq!(parsed.agency, "BFS");
        assert_eq!(parsed.id, "DF_TEST_1");
        assert_eq!(parsed.version, "1.0");
    }

    #[test]
    fn rejects_keys_without_dataflow_marker() {
        assert!(DataflowRef::parse_urn("urn:sdmx:Codelist=BFS:CL_GEO(1.0)").is_none());
        assert!(DataflowRef::parse_urn("not a urn at all").is_none());
    }

    #[test]
    fn composes_structure_and_series_urls() {
        let flow = DataflowRef {
            agency: "BFS".to_string(),
            id: "DF_TEST_1".to_string(),
            version: "1.0".to_string(),
        };
        assert_eq!(
            flow.structure_url("https://example.org/rest"),
            "https://example.org/rest/dataflow/BFS/DF_TEST_1/1.0?references=all"
        );
        assert_eq!(
            flow.series_url("https://example.org/rest"),
            "https://example.org/rest/data/BFS,DF_TEST_1,1.0"
        );
    }
}
