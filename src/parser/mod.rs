//! XML parsing for 3MF model files and slicer settings

mod core;
mod settings;

use std::collections::HashMap;
use std::io::{Read, Seek};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::*;
use crate::opc::Package;

pub use core::{
    ParsedComponent, parse_build_item, parse_component, parse_object, parse_triangle,
    parse_vertex,
};
pub use settings::parse_settings_xml;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Parse the root model of a 3MF package
pub fn parse_3mf<R: Read + Seek>(reader: R) -> Result<Model> {
    let mut package = Package::open(reader)?;
    let model_xml = package.get_model()?;
    parse_model_xml(&model_xml)
}

/// Parse the local element name without the namespace prefix
///
/// - `"p:UUID"` returns `"UUID"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    match name_str.rfind(':') {
        Some(pos) => &name_str[pos + 1..],
        None => name_str,
    }
}

/// Get an attribute value by its local name, regardless of namespace prefix
fn get_attr_by_local_name(attrs: &HashMap<String, String>, local_name: &str) -> Option<String> {
    attrs.iter().find_map(|(key, value)| {
        if get_local_name(key) == local_name {
            Some(value.clone())
        } else {
            None
        }
    })
}

/// Parse attributes from an XML element, unescaping values
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let raw =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = quick_xml::escape::unescape(raw)?;

        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

/// Components collected while parsing, keyed by the owning object's ID
///
/// Components that point into another model part (production extension
/// `path` attribute) are kept here because [`Component`] only models
/// references within one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalComponents {
    /// `(owner object id, component, part path)`
    pub entries: Vec<(usize, Component, String)>,
}

/// Parse the 3D model XML content
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    parse_model_xml_with_external(xml).map(|(model, _)| model)
}

/// Parse the 3D model XML content, also returning cross-part components
pub fn parse_model_xml_with_external(xml: &str) -> Result<(Model, ExternalComponents)> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::new();
    let mut external = ExternalComponents::default();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut current_object: Option<Object> = None;
    let mut current_mesh: Option<Mesh> = None;
    let mut current_metadata: Option<String> = None;
    let mut resources_count = 0;
    let mut build_count = 0;
    let mut model_seen = false;

    loop {
        let event_result = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event_result, Ok(Event::Empty(_)));

        match event_result {
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files".to_string(),
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "model" => {
                        model_seen = true;
                        parse_model_attributes(e, &mut model)?;
                    }
                    "metadata" if current_object.is_none() => {
                        let attrs = parse_attributes(e)?;
                        let name = attrs
                            .get("name")
                            .ok_or_else(|| Error::missing_attribute("metadata", "name"))?;
                        model.metadata.push(MetadataEntry::new(name.clone(), ""));
                        if !is_empty_element {
                            current_metadata = Some(name.clone());
                        }
                    }
                    "resources" => resources_count += 1,
                    "build" => build_count += 1,
                    "object" => {
                        let object = parse_object(e)?;
                        if is_empty_element {
                            model.resources.objects.push(object);
                        } else {
                            current_object = Some(object);
                        }
                    }
                    "mesh" => {
                        if current_object.is_none() {
                            return Err(Error::invalid_xml_element(
                                "mesh",
                                "mesh must be inside an object",
                            ));
                        }
                        current_mesh = Some(Mesh::new());
                    }
                    "vertex" => {
                        let mesh = current_mesh.as_mut().ok_or_else(|| {
                            Error::invalid_xml_element("vertex", "vertex must be inside a mesh")
                        })?;
                        mesh.vertices.push(parse_vertex(e)?);
                    }
                    "triangle" => {
                        let mesh = current_mesh.as_mut().ok_or_else(|| {
                            Error::invalid_xml_element("triangle", "triangle must be inside a mesh")
                        })?;
                        mesh.triangles.push(parse_triangle(e)?);
                    }
                    "component" => {
                        let object = current_object.as_mut().ok_or_else(|| {
                            Error::invalid_xml_element(
                                "component",
                                "component must be inside an object",
                            )
                        })?;
                        let parsed = parse_component(e)?;
                        match parsed.path {
                            Some(path) => {
                                external.entries.push((object.id, parsed.component, path))
                            }
                            None => object.components.push(parsed.component),
                        }
                    }
                    "item" => {
                        model.build.items.push(parse_build_item(e)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(name) = &current_metadata {
                    let text = t.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                    let value = quick_xml::escape::unescape(&text)?;
                    append_metadata_value(&mut model, name, &value);
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(name) = &current_metadata {
                    let value = match r.resolve_char_ref()? {
                        Some(ch) => ch.to_string(),
                        None => {
                            let entity = r.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                            quick_xml::escape::resolve_predefined_entity(&entity)
                                .ok_or_else(|| {
                                    Error::InvalidXml(format!("Unknown entity '&{};'", entity))
                                })?
                                .to_string()
                        }
                    };
                    append_metadata_value(&mut model, name, &value);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "metadata" => current_metadata = None,
                    "object" => {
                        if let Some(mut obj) = current_object.take() {
                            obj.mesh = current_mesh.take();
                            if let Some(mesh) = &obj.mesh {
                                validate_triangle_indices(obj.id, mesh)?;
                            }
                            model.resources.objects.push(obj);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !model_seen {
        return Err(Error::InvalidXml(
            "Document has no <model> root element".to_string(),
        ));
    }
    if resources_count == 0 {
        return Err(Error::InvalidXml(
            "Model must contain a <resources> element".to_string(),
        ));
    }
    if build_count == 0 {
        return Err(Error::InvalidXml(
            "Model must contain a <build> element".to_string(),
        ));
    }

    Ok((model, external))
}

fn parse_model_attributes(e: &BytesStart, model: &mut Model) -> Result<()> {
    let attrs = parse_attributes(e)?;
    let mut prefixes: HashMap<String, Extension> = HashMap::new();

    for (key, value) in &attrs {
        if let Some(prefix) = key.strip_prefix("xmlns:")
            && let Some(ext) = Extension::from_namespace(value)
        {
            prefixes.insert(prefix.to_string(), ext);
            if !model.declared_extensions.contains(&ext) {
                model.declared_extensions.push(ext);
            }
        }
    }
    model.declared_extensions.sort_by_key(|ext| ext.prefix());

    if let Some(unit) = attrs.get("unit") {
        model.unit = unit.clone();
    }
    if let Some(lang) = attrs.get("xml:lang") {
        model.lang = lang.clone();
    }
    if let Some(required) = attrs.get("requiredextensions") {
        for token in required.split_whitespace() {
            let ext = prefixes
                .get(token)
                .copied()
                .or_else(|| Extension::from_namespace(token))
                .ok_or_else(|| {
                    Error::InvalidXml(format!(
                        "Required extension '{}' is not declared or not supported",
                        token
                    ))
                })?;
            model.required_extensions.push(ext);
        }
    }
    Ok(())
}

fn append_metadata_value(model: &mut Model, name: &str, value: &str) {
    if let Some(entry) = model.metadata.iter_mut().rev().find(|m| m.name == name) {
        entry.value.push_str(value);
    }
}

fn validate_triangle_indices(object_id: usize, mesh: &Mesh) -> Result<()> {
    let count = mesh.vertices.len();
    for (index, t) in mesh.triangles.iter().enumerate() {
        if t.v1 >= count || t.v2 >= count || t.v3 >= count {
            return Err(Error::InvalidModel(format!(
                "Object {}: triangle {} references vertex ({}, {}, {}) but the mesh has {} vertices",
                object_id, index, t.v1, t.v2, t.v3, count
            )));
        }
    }
    Ok(())
}
