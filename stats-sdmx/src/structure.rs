//! SDMX-Structure XML parsing.
//!
//! A structure document with `references=all` nests the interesting
//! parts several optional levels deep (structures, data structures,
//! components, dimension list, plus a parallel codelists section).
//! The parser is a single flat event scan: every missing level or
//! attribute degrades to an empty default instead of failing the call.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// A localized text carried by a codelist or code `Name` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizedText {
    pub lang: String,
    pub text: String,
}

/// One code of a codelist, with zero or more localized names.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SdmxCode {
    pub id: String,
    pub names: Vec<LocalizedText>,
}

/// A named set of codes referenced by dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SdmxCodelist {
    pub id: String,
    pub names: Vec<LocalizedText>,
    pub codes: Vec<SdmxCode>,
}

/// A dimension declared by the data structure definition.
///
/// The dimension element itself carries only a stable id and its
/// declared position; the human label comes from the referenced
/// codelist's name.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SdmxDimension {
    pub id: String,
    pub position: i32,
    pub is_time: bool,
    /// Id of the codelist enumerating this dimension's values, when
    /// one is referenced.
    pub codelist: Option<String>,
}

/// Parsed structure document: declared dimensions plus the codelists
/// they reference.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SdmxStructure {
    pub dimensions: Vec<SdmxDimension>,
    pub codelists: Vec<SdmxCodelist>,
}

fn attribute(element: &BytesStart, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// Parse an SDMX-Structure XML document.
///
/// Returns an error only for XML that cannot be read at all; partial
/// or unexpected structure yields empty dimensions/codelists.
pub fn parse_structure(xml: &str) -> Result<SdmxStructure, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut structure = SdmxStructure::default();

    let mut current_dimension: Option<SdmxDimension> = None;
    let mut current_codelist: Option<SdmxCodelist> = None;
    let mut current_code: Option<SdmxCode> = None;
    let mut in_enumeration = false;
    // Language of the Name element whose text is pending, if any.
    let mut pending_name_lang: Option<String> = None;

    fn dimension_from(element: &BytesStart, is_time: bool) -> SdmxDimension {
        SdmxDimension {
            id: attribute(element, b"id").unwrap_or_default(),
            position: attribute(element, b"position")
                .and_then(|p| p.parse().ok())
                .unwrap_or(0),
            is_time,
            codelist: None,
        }
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Dimension" | b"TimeDimension" => {
                    let is_time = e.local_name().as_ref() == b"TimeDimension";
                    current_dimension = Some(dimension_from(&e, is_time));
                }
                b"Enumeration" => {
                    if current_dimension.is_some() {
                        in_enumeration = true;
                    }
                }
                b"Ref" => {
                    if in_enumeration {
                        if let Some(dimension) = current_dimension.as_mut() {
                            dimension.codelist = attribute(&e, b"id");
                        }
                    }
                }
                b"Codelist" => {
                    current_codelist = Some(SdmxCodelist {
                        id: attribute(&e, b"id").unwrap_or_default(),
                        names: Vec::new(),
                        codes: Vec::new(),
                    });
                }
                b"Code" => {
                    if current_codelist.is_some() {
                        current_code = Some(SdmxCode {
                            id: attribute(&e, b"id").unwrap_or_default(),
                            names: Vec::new(),
                        });
                    }
                }
                b"Name" => {
                    // Only codelist and code names matter; Name elements
                    // elsewhere (dataflows, concepts) are ignored.
                    if current_codelist.is_some() {
                        pending_name_lang = Some(attribute(&e, b"lang").unwrap_or_default());
                    }
                }
                _ => {}
            },
            // Self-closing elements complete immediately: no matching
            // End event will follow.
            Event::Empty(e) => match e.local_name().as_ref() {
                b"Dimension" | b"TimeDimension" => {
                    let is_time = e.local_name().as_ref() == b"TimeDimension";
                    structure.dimensions.push(dimension_from(&e, is_time));
                }
                b"Ref" => {
                    if in_enumeration {
                        if let Some(dimension) = current_dimension.as_mut() {
                            dimension.codelist = attribute(&e, b"id");
                        }
                    }
                }
                b"Codelist" => {
                    structure.codelists.push(SdmxCodelist {
                        id: attribute(&e, b"id").unwrap_or_default(),
                        names: Vec::new(),
                        codes: Vec::new(),
                    });
                }
                b"Code" => {
                    if let Some(codelist) = current_codelist.as_mut() {
                        codelist.codes.push(SdmxCode {
                            id: attribute(&e, b"id").unwrap_or_default(),
                            names: Vec::new(),
                        });
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some(lang) = pending_name_lang.take() {
                    let text = t.unescape().map(|c| c.into_owned()).unwrap_or_default();
                    let name = LocalizedText { lang, text };
                    if let Some(code) = current_code.as_mut() {
                        code.names.push(name);
                    } else if let Some(codelist) = current_codelist.as_mut() {
                        codelist.names.push(name);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Dimension" | b"TimeDimension" => {
                    if let Some(dimension) = current_dimension.take() {
                        structure.dimensions.push(dimension);
                    }
                    in_enumeration = false;
                }
                b"Enumeration" => in_enumeration = false,
                b"Code" => {
                    if let (Some(code), Some(codelist)) =
                        (current_code.take(), current_codelist.as_mut())
                    {
                        codelist.codes.push(code);
                    }
                }
                b"Codelist" => {
                    if let Some(codelist) = current_codelist.take() {
                        structure.codelists.push(codelist);
                    }
                }
                b"Name" => pending_name_lang = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(structure)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mes:Structure xmlns:mes="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message"
               xmlns:str="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure"
               xmlns:com="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/common">
  <mes:Structures>
    <str:Codelists>
      <str:Codelist id="CL_GEO">
        <com:Name xml:lang="en">Region</com:Name>
        <com:Name xml:lang="de">Region</com:Name>
        <str:Code id="CH">
          <com:Name xml:lang="en">Switzerland</com:Name>
          <com:Name xml:lang="de">Schweiz</com:Name>
        </str:Code>
        <str:Code id="ZH">
          <com:Name xml:lang="en">Zurich</com:Name>
          <com:Name xml:lang="de">Z&#252;rich</com:Name>
        </str:Code>
      </str:Codelist>
    </str:Codelists>
    <str:DataStructures>
      <str:DataStructure id="DSD_TEST">
        <str:DataStructureComponents>
          <str:DimensionList>
            <str:Dimension id="GEO" position="1">
              <str:LocalRepresentation>
                <str:Enumeration>
                  <Ref id="CL_GEO" class="Codelist"/>
                </str:Enumeration>
              </str:LocalRepresentation>
            </str:Dimension>
            <str:TimeDimension id="TIME_PERIOD" position="2"/>
          </str:DimensionList>
        </str:DataStructureComponents>
      </str:DataStructure>
    </str:DataStructures>
  </mes:Structures>
</mes:Structure>"#;

    #[test]
    fn parses_dimensions_and_codelists() {
        let structure = parse_structure(STRUCTURE_XML).expect("structure should parse");

        assert_eq!(structure.dimensions.len(), 2);
        let geo = &structure.dimensions[0];
        assert_eq!(geo.id, "GEO");
        assert_eq!(geo.position, 1);
        assert!(!geo.is_time);
        assert_eq!(geo.codelist.as_deref(), Some("CL_GEO"));

        let time = &structure.dimensions[1];
        assert_eq!(time.id, "TIME_PERIOD");
        assert!(time.is_time);
        assert_eq!(time.codelist, None);

        assert_eq!(structure.codelists.len(), 1);
        let codelist = &structure.codelists[0];
        assert_eq!(codelist.id, "CL_GEO");
        assert_eq!(codelist.names[0].lang, "en");
        assert_eq!(codelist.names[0].text, "Region");
        assert_eq!(codelist.codes.len(), 2);
        assert_eq!(codelist.codes[1].id, "ZH");
        assert_eq!(codelist.codes[1].names[1].text, "Zürich");
    }

    #[test]
    fn missing_position_defaults_to_zero() {
        let xml = r#"<Structure><Structures><DataStructures><DataStructure>
            <DataStructureComponents><DimensionList>
              <Dimension id="FREQ" position="not-a-number"/>
              <Dimension id="UNIT"/>
            </DimensionList></DataStructureComponents>
        </DataStructure></DataStructures></Structures></Structure>"#;

        let structure = parse_structure(xml).expect("structure should parse");
        assert_eq!(structure.dimensions.len(), 2);
        assert_eq!(structure.dimensions[0].position, 0);
        assert_eq!(structure.dimensions[1].position, 0);
    }

    #[test]
    fn partial_document_degrades_to_empty() {
        let structure = parse_structure("<Structure/>").expect("empty structure should parse");
        assert!(structure.dimensions.is_empty());
        assert!(structure.codelists.is_empty());
    }

    #[test]
    fn dataflow_names_are_not_mistaken_for_codelist_names() {
        let xml = r#"<Structure><Structures>
          <Dataflows><Dataflow id="DF"><Name xml:lang="en">Flow</Name></Dataflow></Dataflows>
          <Codelists><Codelist id="CL"><Name xml:lang="en">List</Name></Codelist></Codelists>
        </Structures></Structure>"#;

        let structure = parse_structure(xml).expect("structure should parse");
        assert_eq!(structure.codelists.len(), 1);
        assert_eq!(structure.codelists[0].names.len(), 1);
        assert_eq!(structure.codelists[0].names[0].text, "List");
    }
}
