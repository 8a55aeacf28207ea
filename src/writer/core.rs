//! Objects, meshes, components and the build section

use crate::error::Result;
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesStart, Event};
use std::io::Write as IoWrite;

use super::{close, emit};

pub(super) fn write_object<W: IoWrite>(writer: &mut Writer<W>, object: &Object) -> Result<()> {
    let mut elem = BytesStart::new("object");
    elem.push_attribute(("id", object.id.to_string().as_str()));
    elem.push_attribute(("type", object.object_type.as_str()));
    if let Some(name) = &object.name {
        elem.push_attribute(("name", name.as_str()));
    }
    emit(writer, Event::Start(elem), "object")?;

    if let Some(mesh) = &object.mesh {
        write_mesh(writer, mesh)?;
    }
    if !object.components.is_empty() {
        emit(writer, Event::Start(BytesStart::new("components")), "components")?;
        for component in &object.components {
            let mut elem = BytesStart::new("component");
            elem.push_attribute(("objectid", component.objectid.to_string().as_str()));
            if let Some(transform) = component.transform {
                elem.push_attribute(("transform", transform.to_string().as_str()));
            }
            emit(writer, Event::Empty(elem), "component")?;
        }
        close(writer, "components")?;
    }

    close(writer, "object")
}

/// Vertex coordinates use the shortest representation that parses back to
/// the same `f64`.
fn write_mesh<W: IoWrite>(writer: &mut Writer<W>, mesh: &Mesh) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("mesh")), "mesh")?;

    emit(writer, Event::Start(BytesStart::new("vertices")), "vertices")?;
    for vertex in &mesh.vertices {
        let (x, y, z) = (vertex.x.to_string(), vertex.y.to_string(), vertex.z.to_string());
        let elem = BytesStart::new("vertex").with_attributes([
            ("x", x.as_str()),
            ("y", y.as_str()),
            ("z", z.as_str()),
        ]);
        emit(writer, Event::Empty(elem), "vertex")?;
    }
    close(writer, "vertices")?;

    emit(writer, Event::Start(BytesStart::new("triangles")), "triangles")?;
    for triangle in &mesh.triangles {
        let (v1, v2, v3) = (
            triangle.v1.to_string(),
            triangle.v2.to_string(),
            triangle.v3.to_string(),
        );
        let elem = BytesStart::new("triangle").with_attributes([
            ("v1", v1.as_str()),
            ("v2", v2.as_str()),
            ("v3", v3.as_str()),
        ]);
        emit(writer, Event::Empty(elem), "triangle")?;
    }
    close(writer, "triangles")?;

    close(writer, "mesh")
}

/// Items without an explicit printable flag omit the attribute
pub(super) fn write_build<W: IoWrite>(writer: &mut Writer<W>, build: &Build) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("build")), "build")?;

    for item in &build.items {
        let mut elem = BytesStart::new("item");
        elem.push_attribute(("objectid", item.objectid.to_string().as_str()));
        if let Some(transform) = item.transform {
            elem.push_attribute(("transform", transform.to_string().as_str()));
        }
        if let Some(printable) = item.printable {
            elem.push_attribute(("printable", if printable { "1" } else { "0" }));
        }
        emit(writer, Event::Empty(elem), "item")?;
    }

    close(writer, "build")
}
