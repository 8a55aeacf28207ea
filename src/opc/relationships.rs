//! Package relationship discovery

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Root relationships written when the template does not carry them
pub const DEFAULT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// Find the target of the first 3D model relationship in a `.rels` document
pub(super) fn find_model_target(rels_xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = std::str::from_utf8(&attr.value)
                            .map_err(|e| Error::InvalidXml(e.to_string()))?;
                        match attr.key.as_ref() {
                            b"Target" => target = Some(value.to_string()),
                            b"Type" => rel_type = Some(value.to_string()),
                            _ => {}
                        }
                    }

                    if let (Some(t), Some(rt)) = (target, rel_type)
                        && rt == MODEL_REL_TYPE
                    {
                        return Ok(Some(t));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(None)
}
