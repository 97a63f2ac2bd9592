//! SDMX-GenericData XML parsing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// One raw observation from a generic-data document: the dimension
/// key-value pairs in document order, plus the numeric measure.
///
/// A missing or empty `ObsValue` is an explicit `None`, never zero.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SdmxObservation {
    pub key: Vec<(String, String)>,
    pub value: Option<f64>,
}

fn attribute(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Parse an SDMX-GenericData XML document into raw observations.
///
/// A structurally valid document with no `Obs` entries yields an empty
/// vector. Unparsable numeric values degrade to `None` rather than
/// failing the batch.
pub fn parse_generic_data(xml: &str) -> Result<Vec<SdmxObservation>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut observations = Vec::new();
    let mut current: Option<SdmxObservation> = None;
    let mut in_obs_key = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"Obs" => current = Some(SdmxObservation::default()),
                b"ObsKey" => in_obs_key = current.is_some(),
                b"Value" => {
                    if in_obs_key {
                        if let Some(obs) = current.as_mut() {
                            let id = attribute(&e, b"id").unwrap_or_default();
                            let value = attribute(&e, b"value").unwrap_or_default();
                            obs.key.push((id, value));
                        }
                    }
                }
                b"ObsValue" => {
                    if let Some(obs) = current.as_mut() {
                        obs.value = attribute(&e, b"value")
                            .filter(|v| !v.is_empty())
                            .and_then(|v| v.parse().ok());
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"Obs" => {
                    if let Some(obs) = current.take() {
                        observations.push(obs);
                    }
                    in_obs_key = false;
                }
                b"ObsKey" => in_obs_key = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mes:GenericData xmlns:mes="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message"
                 xmlns:gen="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/data/generic">
  <mes:DataSet>
    <gen:Obs>
      <gen:ObsKey>
        <gen:Value id="GEO" value="CH"/>
        <gen:Value id="TIME_PERIOD" value="2020"/>
      </gen:ObsKey>
      <gen:ObsValue value="100.5"/>
    </gen:Obs>
    <gen:Obs>
      <gen:ObsKey>
        <gen:Value id="GEO" value="ZH"/>
        <gen:Value id="TIME_PERIOD" value="2020"/>
      </gen:ObsKey>
      <gen:ObsValue value=""/>
    </gen:Obs>
    <gen:Obs>
      <gen:ObsKey>
        <gen:Value id="GEO" value="BE"/>
      </gen:ObsKey>
    </gen:Obs>
  </mes:DataSet>
</mes:GenericData>"#;

    #[test]
    fn parses_key_value_pairs_and_measure() {
        let observations = parse_generic_data(DATA_XML).expect("data should parse");
        assert_eq!(observations.len(), 3);

        assert_eq!(
            observations[0].key,
            vec![
                ("GEO".to_string(), "CH".to_string()),
                ("TIME_PERIOD".to_string(), "2020".to_string())
            ]
        );
        assert_eq!(observations[0].value, Some(100.5));
    }

    #[test]
    fn empty_or_missing_measure_is_none_not_zero() {
        let observations = parse_generic_data(DATA_XML).expect("data should parse");
        assert_eq!(observations[1].value, None);
        assert_eq!(observations[2].value, None);
    }

    #[test]
    fn empty_dataset_yields_empty_sequence() {
        let xml = "<GenericData><DataSet/></GenericData>";
        let observations = parse_generic_data(xml).expect("empty data should parse");
        assert!(observations.is_empty());
    }
}
