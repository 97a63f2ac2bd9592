//! Normalization of upstream-native metadata and observations into the
//! canonical model.

use crate::model::{Dimension, DimensionValue, Language, Observation};
use std::collections::{BTreeMap, HashMap, HashSet};

use stats_px::models::PxTableMetadata;
use stats_sdmx::data::SdmxObservation;
use stats_sdmx::structure::{LocalizedText, SdmxCodelist, SdmxStructure};

/// Resolve a localized text in the requested language, falling back to
/// the first declared localization when the exact language is absent.
fn localized(names: &[LocalizedText], language: Language) -> Option<String> {
    names
        .iter()
        .find(|name| name.lang == language.as_str())
        .or_else(|| names.first())
        .map(|name| name.text.clone())
}

/// Drop duplicate value codes within one dimension, keeping the first
/// occurrence and the declared order.
fn dedupe(values: Vec<DimensionValue>) -> Vec<DimensionValue> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.code.clone()))
        .collect()
}

/// Map the tabular `variables` array into canonical dimensions.
///
/// The upstream shape is already near-canonical: this is a direct
/// field mapping with defaulting. Missing labels default to the code;
/// missing value-text arrays default to the value codes themselves.
pub fn dimensions_from_px(metadata: &PxTableMetadata) -> Vec<Dimension> {
    metadata
        .variables
        .iter()
        .enumerate()
        .map(|(index, variable)| {
            let values = variable
                .values
                .iter()
                .enumerate()
                .map(|(i, code)| DimensionValue {
                    code: code.clone(),
                    label: variable
                        .value_texts
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| code.clone()),
                })
                .collect();

            Dimension {
                code: variable.code.clone(),
                label: variable
                    .text
                    .clone()
                    .unwrap_or_else(|| variable.code.clone()),
                is_time: variable.time,
                position: index as i32,
                values: dedupe(values),
            }
        })
        .collect()
}

/// Join the parsed SDMX structure into canonical dimensions.
///
/// The dimension element carries only a stable id; the display label
/// is inherited from the referenced codelist's localized name, and the
/// value list from that codelist's codes in declared order. A
/// dimension without a codelist reference, or with an empty codelist,
/// normalizes to an empty value list rather than failing the call.
pub fn dimensions_from_structure(structure: &SdmxStructure, language: Language) -> Vec<Dimension> {
    let codelists: HashMap<&str, &SdmxCodelist> = structure
        .codelists
        .iter()
        .map(|codelist| (codelist.id.as_str(), codelist))
        .collect();

    structure
        .dimensions
        .iter()
        .map(|dimension| {
            let codelist = dimension
                .codelist
                .as_deref()
                .and_then(|id| codelists.get(id).copied());

            let label = codelist
                .and_then(|codelist| localized(&codelist.names, language))
                .unwrap_or_else(|| dimension.id.clone());

            let values = codelist
                .map(|codelist| {
                    codelist
                        .codes
                        .iter()
                        .map(|code| DimensionValue {
                            code: code.id.clone(),
                            label: localized(&code.names, language)
                                .unwrap_or_else(|| code.id.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default();

            Dimension {
                code: dimension.id.clone(),
                label,
                is_time: dimension.is_time,
                position: dimension.position,
                values: dedupe(values),
            }
        })
        .collect()
}

/// Resolve raw time-series observations against canonical dimensions.
///
/// Each raw key code is replaced by its value label when the dimension
/// and value both match exactly; unmapped codes stay raw rather than
/// failing the observation.
pub fn observations_from_sdmx(
    raw: &[SdmxObservation],
    dimensions: &[Dimension],
) -> Vec<Observation> {
    raw.iter()
        .map(|observation| {
            let mut resolved = BTreeMap::new();
            for (dimension_id, code) in &observation.key {
                let label = dimensions
                    .iter()
                    .find(|dimension| &dimension.code == dimension_id)
                    .and_then(|dimension| {
                        dimension
                            .values
                            .iter()
                            .find(|value| &value.code == code)
                            .map(|value| value.label.clone())
                    })
                    .unwrap_or_else(|| code.clone());
                resolved.insert(dimension_id.clone(), label);
            }
            Observation {
                dimensions: resolved,
                value: observation.value,
            }
        })
        .collect()
}
