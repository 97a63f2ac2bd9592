use swiss_stats::model::Language;
use swiss_stats::normalize::{
    dimensions_from_px, dimensions_from_structure, observations_from_sdmx,
};

use stats_px::models::{PxTableMetadata, PxVariable};
use stats_sdmx::data::SdmxObservation;
use stats_sdmx::structure::{
    LocalizedText, SdmxCode, SdmxCodelist, SdmxDimension, SdmxStructure,
};

fn text(lang: &str, value: &str) -> LocalizedText {
    LocalizedText {
        lang: lang.to_string(),
        text: value.to_string(),
    }
}

fn variable(code: &str) -> PxVariable {
    PxVariable {
        code: code.to_string(),
        text: None,
        values: Vec::new(),
        value_texts: Vec::new(),
        time: false,
        elimination: false,
    }
}

#[test]
fn px_mapping_defaults_missing_labels_to_the_code() {
    let metadata = PxTableMetadata {
        title: None,
        variables: vec![
            PxVariable {
                code: "Kanton".to_string(),
                text: Some("Canton".to_string()),
                values: vec!["ZH".to_string(), "BE".to_string()],
                value_texts: vec!["Zürich".to_string()],
                time: false,
                elimination: false,
            },
            PxVariable {
                time: true,
                ..variable("Jahr")
            },
        ],
    };

    let dimensions = dimensions_from_px(&metadata);

    assert_eq!(dimensions.len(), 2);
    assert_eq!(dimensions[0].label, "Canton");
    assert_eq!(dimensions[0].position, 0);
    assert_eq!(dimensions[0].values[0].label, "Zürich");
    // No value text supplied for BE, so the code stands in.
    assert_eq!(dimensions[0].values[1].label, "BE");

    assert_eq!(dimensions[1].label, "Jahr");
    assert!(dimensions[1].is_time);
    assert_eq!(dimensions[1].position, 1);
    assert!(dimensions[1].values.is_empty());
}

#[test]
fn px_duplicate_value_codes_keep_first_occurrence() {
    let metadata = PxTableMetadata {
        title: None,
        variables: vec![PxVariable {
            values: vec!["A".to_string(), "A".to_string(), "B".to_string()],
            value_texts: vec!["first".to_string(), "second".to_string(), "b".to_string()],
            ..variable("Dim")
        }],
    };

    let dimensions = dimensions_from_px(&metadata);
    assert_eq!(dimensions[0].values.len(), 2);
    assert_eq!(dimensions[0].values[0].label, "first");
}

fn sample_structure() -> SdmxStructure {
    SdmxStructure {
        dimensions: vec![
            SdmxDimension {
                id: "GEO".to_string(),
                position: 1,
                is_time: false,
                codelist: Some("CL_GEO".to_string()),
            },
            SdmxDimension {
                id: "FREQ".to_string(),
                position: 2,
                is_time: false,
                codelist: None,
            },
        ],
        codelists: vec![SdmxCodelist {
            id: "CL_GEO".to_string(),
            names: vec![text("en", "Region"), text("de", "Region")],
            codes: vec![SdmxCode {
                id: "ZH".to_string(),
                names: vec![text("en", "Zurich"), text("de", "Zürich")],
            }],
        }],
    }
}

#[test]
fn dimension_label_is_inherited_from_codelist_name() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::En);
    assert_eq!(dimensions[0].code, "GEO");
    assert_eq!(dimensions[0].label, "Region");
    assert_eq!(dimensions[0].position, 1);
}

#[test]
fn absent_language_falls_back_to_first_declared_name_not_the_code() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::Fr);
    // "fr" is absent; the first declared localization wins.
    assert_eq!(dimensions[0].values[0].label, "Zurich");
}

#[test]
fn exact_language_match_is_preferred() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::De);
    assert_eq!(dimensions[0].values[0].label, "Zürich");
}

#[test]
fn dimension_without_codelist_gets_empty_values_and_its_id_as_label() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::En);
    assert_eq!(dimensions[1].code, "FREQ");
    assert_eq!(dimensions[1].label, "FREQ");
    assert!(dimensions[1].values.is_empty());
}

#[test]
fn observation_codes_resolve_to_labels_and_unknown_codes_stay_raw() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::En);
    let raw = vec![SdmxObservation {
        key: vec![
            ("GEO".to_string(), "ZH".to_string()),
            ("GEO".to_string(), "XX".to_string()),
            ("UNKNOWN_DIM".to_string(), "Y".to_string()),
        ],
        value: Some(7.5),
    }];

    let observations = observations_from_sdmx(&raw, &dimensions);

    assert_eq!(observations.len(), 1);
    // Later key entry for the same id wins the map slot; both
    // resolution outcomes are exercised above.
    assert_eq!(observations[0].dimensions["UNKNOWN_DIM"], "Y");
    assert_eq!(observations[0].dimensions["GEO"], "XX");
    assert_eq!(observations[0].value, Some(7.5));
}

#[test]
fn missing_measure_stays_none() {
    let dimensions = dimensions_from_structure(&sample_structure(), Language::En);
    let raw = vec![SdmxObservation {
        key: vec![("GEO".to_string(), "ZH".to_string())],
        value: None,
    }];

    let observations = observations_from_sdmx(&raw, &dimensions);
    assert_eq!(observations[0].dimensions["GEO"], "Zurich");
    assert_eq!(observations[0].value, None);
}
