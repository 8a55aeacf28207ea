//! Parsing of `Metadata/model_settings.config`

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::geometry::Transform;
use crate::model::*;

use super::core::{parse_bool, required_usize};
use super::{XML_BUFFER_CAPACITY, get_local_name, parse_attributes};

#[derive(Default)]
struct PartState {
    id: usize,
    subtype: String,
    metadata: HashMap<String, String>,
    mesh_stat: MeshStat,
}

#[derive(Default)]
struct ObjectState {
    id: usize,
    metadata: HashMap<String, String>,
    face_count: Option<usize>,
    parts: Vec<SettingsPart>,
}

/// Parse a settings document
///
/// Unknown elements and metadata keys are ignored. Numeric metadata values
/// that are present must parse.
pub fn parse_settings_xml(xml: &str) -> Result<SettingsDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = SettingsDocument::new();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut config_seen = false;
    let mut object: Option<ObjectState> = None;
    let mut part: Option<PartState> = None;
    let mut plate: Option<HashMap<String, String>> = None;
    let mut plate_instances: Vec<ModelInstance> = Vec::new();
    let mut instance: Option<HashMap<String, String>> = None;

    loop {
        let event_result = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event_result, Ok(Event::Empty(_)));

        match event_result {
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in settings documents".to_string(),
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "config" => config_seen = true,
                    "object" => {
                        let attrs = parse_attributes(e)?;
                        object = Some(ObjectState {
                            id: required_usize(&attrs, "object", "id")?,
                            ..ObjectState::default()
                        });
                    }
                    "part" => {
                        let attrs = parse_attributes(e)?;
                        part = Some(PartState {
                            id: required_usize(&attrs, "part", "id")?,
                            subtype: attrs
                                .get("subtype")
                                .cloned()
                                .unwrap_or_else(|| NORMAL_PART.to_string()),
                            ..PartState::default()
                        });
                    }
                    "mesh_stat" => {
                        let attrs = parse_attributes(e)?;
                        if let Some(p) = part.as_mut() {
                            p.mesh_stat = parse_mesh_stat(&attrs)?;
                        }
                    }
                    "plate" => {
                        plate = Some(HashMap::new());
                        plate_instances.clear();
                    }
                    "model_instance" => instance = Some(HashMap::new()),
                    "metadata" => {
                        let attrs = parse_attributes(e)?;
                        let target = if let Some(i) = instance.as_mut() {
                            Some(i)
                        } else if let Some(p) = plate.as_mut() {
                            Some(p)
                        } else if let Some(p) = part.as_mut() {
                            Some(&mut p.metadata)
                        } else if let Some(o) = object.as_mut() {
                            if let Some(count) = attrs.get("face_count") {
                                o.face_count = Some(parse_count("face_count", count)?);
                            }
                            Some(&mut o.metadata)
                        } else {
                            None
                        };
                        if let (Some(target), Some(key)) = (target, attrs.get("key")) {
                            target.insert(
                                key.clone(),
                                attrs.get("value").cloned().unwrap_or_default(),
                            );
                        }
                    }
                    "assemble_item" => {
                        let attrs = parse_attributes(e)?;
                        doc.assemble.push(parse_assemble_item(&attrs)?);
                    }
                    _ => {}
                }

                if is_empty_element {
                    close_element(
                        get_local_name(name_str),
                        &mut doc,
                        &mut object,
                        &mut part,
                        &mut plate,
                        &mut plate_instances,
                        &mut instance,
                    )?;
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                close_element(
                    get_local_name(name_str),
                    &mut doc,
                    &mut object,
                    &mut part,
                    &mut plate,
                    &mut plate_instances,
                    &mut instance,
                )?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !config_seen {
        return Err(Error::InvalidXml(
            "Settings document has no <config> root element".to_string(),
        ));
    }

    Ok(doc)
}

fn close_element(
    local_name: &str,
    doc: &mut SettingsDocument,
    object: &mut Option<ObjectState>,
    part: &mut Option<PartState>,
    plate: &mut Option<HashMap<String, String>>,
    plate_instances: &mut Vec<ModelInstance>,
    instance: &mut Option<HashMap<String, String>>,
) -> Result<()> {
    match local_name {
        "part" => {
            if let (Some(p), Some(o)) = (part.take(), object.as_mut()) {
                o.parts.push(finish_part(p)?);
            }
        }
        "object" => {
            if let Some(o) = object.take() {
                doc.objects.push(finish_object(o)?);
            }
        }
        "model_instance" => {
            if let Some(i) = instance.take() {
                plate_instances.push(ModelInstance {
                    object_id: required_usize(&i, "model_instance", "object_id")?,
                    instance_id: optional_count(&i, "instance_id")?.unwrap_or(0),
                    identify_id: optional_count(&i, "identify_id")?.unwrap_or(0),
                });
            }
        }
        "plate" => {
            if let Some(p) = plate.take() {
                doc.plates.push(SettingsPlate {
                    plater_id: optional_count(&p, "plater_id")?.unwrap_or(doc.plates.len() + 1),
                    plater_name: p.get("plater_name").cloned().unwrap_or_default(),
                    locked: match p.get("locked") {
                        Some(v) => parse_bool("plate locked", v)?,
                        None => false,
                    },
                    filament_map_mode: p
                        .get("filament_map_mode")
                        .cloned()
                        .unwrap_or_else(|| FILAMENT_MAP_MODE.to_string()),
                    instances: std::mem::take(plate_instances),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn finish_part(state: PartState) -> Result<SettingsPart> {
    let m = &state.metadata;
    Ok(SettingsPart {
        id: state.id,
        subtype: state.subtype,
        name: m.get("name").cloned().unwrap_or_default(),
        matrix: m
            .get("matrix")
            .cloned()
            .unwrap_or_else(|| IDENTITY_MATRIX.to_string()),
        source_file: m.get("source_file").cloned().unwrap_or_default(),
        source_object_id: optional_count(m, "source_object_id")?.unwrap_or(0),
        source_volume_id: optional_count(m, "source_volume_id")?.unwrap_or(0),
        extruder: parse_extruder(m)?,
        mesh_stat: state.mesh_stat,
    })
}

fn finish_object(state: ObjectState) -> Result<SettingsObject> {
    let m = &state.metadata;
    let face_count = match state.face_count {
        Some(count) => count,
        None => match optional_count(m, "face_count")? {
            Some(count) => count,
            None => state.parts.iter().map(|p| p.mesh_stat.face_count).sum(),
        },
    };
    Ok(SettingsObject {
        id: state.id,
        name: m.get("name").cloned().unwrap_or_default(),
        extruder: parse_extruder(m)?,
        face_count,
        parts: state.parts,
    })
}

fn parse_extruder(metadata: &HashMap<String, String>) -> Result<u8> {
    match metadata.get("extruder") {
        Some(value) => value
            .trim()
            .parse::<u8>()
            .map_err(|_| Error::parse_error_with_context("extruder", value, "filament slot")),
        None => Ok(1),
    }
}

fn parse_mesh_stat(attrs: &HashMap<String, String>) -> Result<MeshStat> {
    Ok(MeshStat {
        face_count: optional_count(attrs, "face_count")?.unwrap_or(0),
        edges_fixed: optional_count(attrs, "edges_fixed")?.unwrap_or(0),
        degenerate_facets: optional_count(attrs, "degenerate_facets")?.unwrap_or(0),
        facets_removed: optional_count(attrs, "facets_removed")?.unwrap_or(0),
        facets_reversed: optional_count(attrs, "facets_reversed")?.unwrap_or(0),
        backwards_edges: optional_count(attrs, "backwards_edges")?.unwrap_or(0),
    })
}

fn parse_assemble_item(attrs: &HashMap<String, String>) -> Result<AssembleItem> {
    let transform = attrs
        .get("transform")
        .ok_or_else(|| Error::missing_attribute("assemble_item", "transform"))?
        .parse::<Transform>()?;

    let mut offset = [0.0; 3];
    if let Some(raw) = attrs.get("offset") {
        let values: Vec<&str> = raw.split_whitespace().collect();
        if values.len() != 3 {
            return Err(Error::parse_error_with_context(
                "assemble_item offset",
                raw,
                "three numbers",
            ));
        }
        for (slot, value) in offset.iter_mut().zip(values) {
            *slot = value.parse::<f64>()?;
        }
    }

    Ok(AssembleItem {
        object_id: required_usize(attrs, "assemble_item", "object_id")?,
        instance_id: optional_count(attrs, "instance_id")?.unwrap_or(0),
        transform,
        offset,
    })
}

fn parse_count(field: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| Error::parse_error_with_context(field, value, "non-negative integer"))
}

fn optional_count(map: &HashMap<String, String>, key: &str) -> Result<Option<usize>> {
    map.get(key).map(|v| parse_count(key, v)).transpose()
}
