//! XML writing for 3MF model files and slicer settings
//!
//! This module serializes [`Model`] into `3D/3dmodel.model` content and
//! [`SettingsDocument`] into `Metadata/model_settings.config` content.

mod core;
mod settings;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write as IoWrite;

pub use settings::{settings_to_string, write_settings_xml};

/// Write a Model to XML format
///
/// Every extension in `declared_extensions` or `required_extensions` gets an
/// `xmlns:<prefix>` declaration; `required_extensions` also populate the
/// `requiredextensions` attribute.
pub fn write_model_xml<W: IoWrite>(model: &Model, writer: W) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    write_declaration(&mut xml_writer)?;

    let mut model_elem = BytesStart::new("model");
    model_elem.push_attribute(("unit", model.unit.as_str()));
    model_elem.push_attribute(("xml:lang", model.lang.as_str()));
    model_elem.push_attribute(("xmlns", CORE_NAMESPACE));

    let mut declared: Vec<Extension> = Vec::new();
    for ext in model
        .declared_extensions
        .iter()
        .chain(&model.required_extensions)
    {
        if *ext != Extension::Core && !declared.contains(ext) {
            declared.push(*ext);
        }
    }
    for ext in &declared {
        let name = format!("xmlns:{}", ext.prefix());
        model_elem.push_attribute((name.as_str(), ext.namespace()));
    }

    let required: Vec<&str> = model
        .required_extensions
        .iter()
        .filter(|e| **e != Extension::Core)
        .map(Extension::prefix)
        .collect();
    if !required.is_empty() {
        model_elem.push_attribute(("requiredextensions", required.join(" ").as_str()));
    }

    xml_writer
        .write_event(Event::Start(model_elem))
        .map_err(|e| Error::xml_write(format!("Failed to write model element: {}", e)))?;

    for entry in &model.metadata {
        write_metadata(&mut xml_writer, entry)?;
    }

    write_resources(&mut xml_writer, &model.resources)?;
    core::write_build(&mut xml_writer, &model.build)?;

    xml_writer
        .write_event(Event::End(BytesEnd::new("model")))
        .map_err(|e| Error::xml_write(format!("Failed to close model element: {}", e)))?;

    Ok(())
}

/// Serialize a Model into a string
pub fn model_to_string(model: &Model) -> Result<String> {
    let mut buffer = Vec::new();
    write_model_xml(model, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::xml_write(e.to_string()))
}

pub(crate) fn write_declaration<W: IoWrite>(writer: &mut Writer<W>) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;
    Ok(())
}

fn write_metadata<W: IoWrite>(writer: &mut Writer<W>, entry: &MetadataEntry) -> Result<()> {
    let mut elem = BytesStart::new("metadata");
    elem.push_attribute(("name", entry.name.as_str()));
    emit(writer, Event::Start(elem), "metadata")?;
    emit(writer, Event::Text(BytesText::new(&entry.value)), "metadata value")?;
    close(writer, "metadata")
}

fn write_resources<W: IoWrite>(writer: &mut Writer<W>, resources: &Resources) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("resources")), "resources")?;
    for object in &resources.objects {
        core::write_object(writer, object)?;
    }
    close(writer, "resources")
}

/// Write one event, naming `what` in the error
fn emit<W: IoWrite>(writer: &mut Writer<W>, event: Event<'_>, what: &str) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::xml_write(format!("Failed to write {}: {}", what, e)))?;
    Ok(())
}

fn close<W: IoWrite>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| Error::xml_write(format!("Failed to close {} element: {}", name, e)))?;
    Ok(())
}
