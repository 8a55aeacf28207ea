//! Writing of `Metadata/model_settings.config`

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};
use std::io::Write as IoWrite;

use super::{close, emit, write_declaration};

/// Write a settings document
pub fn write_settings_xml<W: IoWrite>(doc: &SettingsDocument, writer: W) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    write_declaration(&mut xml_writer)?;
    start(&mut xml_writer, BytesStart::new("config"))?;

    for object in &doc.objects {
        write_object(&mut xml_writer, object)?;
    }

    for plate in &doc.plates {
        write_plate(&mut xml_writer, plate)?;
    }

    start(&mut xml_writer, BytesStart::new("assemble"))?;
    for item in &doc.assemble {
        write_assemble_item(&mut xml_writer, item)?;
    }
    close(&mut xml_writer, "assemble")?;

    close(&mut xml_writer, "config")
}

/// Serialize a settings document into a string
pub fn settings_to_string(doc: &SettingsDocument) -> Result<String> {
    let mut buffer = Vec::new();
    write_settings_xml(doc, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::xml_write(e.to_string()))
}

fn write_object<W: IoWrite>(writer: &mut Writer<W>, object: &SettingsObject) -> Result<()> {
    let mut elem = BytesStart::new("object");
    elem.push_attribute(("id", object.id.to_string().as_str()));
    start(writer, elem)?;

    write_key_value(writer, "name", &object.name)?;
    write_key_value(writer, "extruder", &object.extruder.to_string())?;

    let mut face_count = BytesStart::new("metadata");
    face_count.push_attribute(("face_count", object.face_count.to_string().as_str()));
    empty(writer, face_count)?;

    for part in &object.parts {
        write_part(writer, part)?;
    }

    close(writer, "object")
}

fn write_part<W: IoWrite>(writer: &mut Writer<W>, part: &SettingsPart) -> Result<()> {
    let mut elem = BytesStart::new("part");
    elem.push_attribute(("id", part.id.to_string().as_str()));
    elem.push_attribute(("subtype", part.subtype.as_str()));
    start(writer, elem)?;

    write_key_value(writer, "name", &part.name)?;
    write_key_value(writer, "matrix", &part.matrix)?;
    write_key_value(writer, "source_file", &part.source_file)?;
    write_key_value(writer, "source_object_id", &part.source_object_id.to_string())?;
    write_key_value(writer, "source_volume_id", &part.source_volume_id.to_string())?;
    write_key_value(writer, "extruder", &part.extruder.to_string())?;

    let stat = &part.mesh_stat;
    let mut elem = BytesStart::new("mesh_stat");
    for (name, value) in [
        ("face_count", stat.face_count),
        ("edges_fixed", stat.edges_fixed),
        ("degenerate_facets", stat.degenerate_facets),
        ("facets_removed", stat.facets_removed),
        ("facets_reversed", stat.facets_reversed),
        ("backwards_edges", stat.backwards_edges),
    ] {
        elem.push_attribute((name, value.to_string().as_str()));
    }
    empty(writer, elem)?;

    close(writer, "part")
}

fn write_plate<W: IoWrite>(writer: &mut Writer<W>, plate: &SettingsPlate) -> Result<()> {
    start(writer, BytesStart::new("plate"))?;

    write_key_value(writer, "plater_id", &plate.plater_id.to_string())?;
    write_key_value(writer, "plater_name", &plate.plater_name)?;
    write_key_value(writer, "locked", if plate.locked { "true" } else { "false" })?;
    write_key_value(writer, "filament_map_mode", &plate.filament_map_mode)?;

    for instance in &plate.instances {
        start(writer, BytesStart::new("model_instance"))?;
        write_key_value(writer, "object_id", &instance.object_id.to_string())?;
        write_key_value(writer, "instance_id", &instance.instance_id.to_string())?;
        write_key_value(writer, "identify_id", &instance.identify_id.to_string())?;
        close(writer, "model_instance")?;
    }

    close(writer, "plate")
}

fn write_assemble_item<W: IoWrite>(writer: &mut Writer<W>, item: &AssembleItem) -> Result<()> {
    let offset = item
        .offset
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    let mut elem = BytesStart::new("assemble_item");
    elem.push_attribute(("object_id", item.object_id.to_string().as_str()));
    elem.push_attribute(("instance_id", item.instance_id.to_string().as_str()));
    elem.push_attribute(("transform", item.transform.to_string().as_str()));
    elem.push_attribute(("offset", offset.as_str()));
    empty(writer, elem)
}

fn write_key_value<W: IoWrite>(writer: &mut Writer<W>, key: &str, value: &str) -> Result<()> {
    let mut elem = BytesStart::new("metadata");
    elem.push_attribute(("key", key));
    elem.push_attribute(("value", value));
    empty(writer, elem)
}

fn start<W: IoWrite>(writer: &mut Writer<W>, elem: BytesStart<'_>) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    emit(writer, Event::Start(elem), &name)
}

fn empty<W: IoWrite>(writer: &mut Writer<W>, elem: BytesStart<'_>) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    emit(writer, Event::Empty(elem), &name)
}
