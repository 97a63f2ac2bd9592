//! Upstream-specific query construction from canonical dimensions and
//! a simplified filter.

use crate::model::{Dimension, Filter};
use stats_px::models::{PxQuery, PxQueryEntry, PxResponse, PxSelection};

/// Build a tabular (PxWeb) query payload.
///
/// With no filter, every dimension is selected with the `all` wildcard.
/// With a filter, only the dimensions it names appear, each with an
/// explicit `item` selection; dimensions the filter does not mention
/// are omitted entirely, which the upstream treats as its own default
/// selection. That asymmetry is the upstream's contract and is passed
/// through unchanged.
///
/// Entries always follow the dataset's own dimension order, not the
/// filter's.
pub fn build_px_query(dimensions: &[Dimension], filter: Option<&Filter>, format: &str) -> PxQuery {
    let entries = match filter {
        None => dimensions
            .iter()
            .map(|dimension| PxQueryEntry {
                code: dimension.code.clone(),
                selection: PxSelection::all(),
            })
            .collect(),
        Some(filter) => dimensions
            .iter()
            .filter_map(|dimension| {
                filter.get(&dimension.code).map(|selection| PxQueryEntry {
                    code: dimension.code.clone(),
                    selection: PxSelection::items(selection.to_codes()),
                })
            })
            .collect(),
    };

    PxQuery {
        query: entries,
        response: PxResponse {
            format: format.to_string(),
        },
    }
}

/// Build the time-series positional key segment.
///
/// Dimensions are ordered by their declared `position`; each position
/// contributes either its `+`-joined selected value codes or an empty
/// segment, all joined with `.`. When nothing is filtered at all, the
/// key collapses to the literal `all` wildcard.
pub fn build_sdmx_key(dimensions: &[Dimension], filter: Option<&Filter>) -> String {
    let filter = match filter {
        Some(filter) if !filter.is_empty() => filter,
        _ => return "all".to_string(),
    };

    let mut ordered: Vec<&Dimension> = dimensions.iter().collect();
    ordered.sort_by_key(|dimension| dimension.position);

    let segments: Vec<String> = ordered
        .iter()
        .map(|dimension| match filter.get(&dimension.code) {
            Some(selection) => selection.to_codes().join("+"),
            None => String::new(),
        })
        .collect();

    if segments.iter().all(|segment| segment.is_empty()) {
        "all".to_string()
    } else {
        segments.join(".")
    }
}
