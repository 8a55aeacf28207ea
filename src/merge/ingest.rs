//! Reading source packages into mesh parts

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::{debug, info};

use super::{MeshPart, ObjectGroup, Plate};
use crate::config::{MAX_FILAMENT_SLOT, MergeSpec, PartSpec};
use crate::error::{Error, Result};
use crate::geometry::rotate_vertices;
use crate::model::{Mesh, Model};
use crate::opc::Package;
use crate::parser::{parse_model_xml, parse_model_xml_with_external};

/// Read every part of an expanded merge description
///
/// Parts are visited in plate, object, part order. Each gets the next object
/// ID starting at 1, its filament slot resolved and its rotation baked into
/// the vertices.
pub(super) fn ingest(spec: &MergeSpec) -> Result<Vec<Plate>> {
    let mut next_index = 0;
    let mut plates = Vec::with_capacity(spec.plates.len());

    for plate in &spec.plates {
        let mut groups = Vec::with_capacity(plate.objects.len());
        for object in &plate.objects {
            let mut parts = Vec::with_capacity(object.parts.len());
            for part in &object.parts {
                parts.push(ingest_part(part, next_index)?);
                next_index += 1;
            }
            groups.push(ObjectGroup {
                name: object.name.clone(),
                normalize: object.normalize_position,
                parts,
            });
        }
        plates.push(Plate {
            name: plate.name.clone().unwrap_or_default(),
            groups,
        });
    }

    info!("Ingested {} parts", next_index);
    Ok(plates)
}

/// Filament slot of a part: explicit slots are kept, 0 cycles through 1-4
pub(crate) fn resolve_filament(requested: u8, index: usize) -> u8 {
    if requested == 0 {
        (index % MAX_FILAMENT_SLOT as usize) as u8 + 1
    } else {
        requested
    }
}

fn ingest_part(spec: &PartSpec, index: usize) -> Result<MeshPart> {
    let mut mesh = read_mesh(&spec.file)?;
    let min_z = rotate_vertices(
        &mut mesh,
        spec.rotation.x,
        spec.rotation.y,
        spec.rotation.z,
    )
    .map_err(|e| Error::geometry(format!("{}: {}", spec.file.display(), e)))?;

    let id = index + 1;
    let filament = resolve_filament(spec.filament, index);
    debug!(
        "Part '{}' from {} -> object {} ({} faces, filament {}, min z {:.3})",
        spec.name,
        spec.file.display(),
        id,
        mesh.face_count(),
        filament,
        min_z
    );

    Ok(MeshPart {
        name: spec.name.clone(),
        source_file: spec.file.clone(),
        id,
        filament,
        position: spec.position,
        mesh,
        min_z,
    })
}

/// Read the geometry of a source package as one mesh
pub fn read_mesh(path: &Path) -> Result<Mesh> {
    let file = File::open(path)
        .map_err(|e| Error::InvalidFormat(format!("Cannot open {}: {}", path.display(), e)))?;
    let mut package = Package::open(file)?;
    package_mesh(&mut package).map_err(|e| match e {
        Error::InvalidModel(msg) => Error::InvalidModel(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Concatenate the mesh objects of a package
///
/// Mesh objects of the root model are used when there are any. Otherwise
/// components pointing into other model parts of the package are followed,
/// with their transforms applied to the referenced vertices.
pub(crate) fn package_mesh<R: Read + Seek>(package: &mut Package<R>) -> Result<Mesh> {
    let root_xml = package.get_model()?;
    let (model, external) = parse_model_xml_with_external(&root_xml)?;

    let mut mesh = concat_meshes(&model);
    if mesh.vertices.is_empty() {
        for (_, component, path) in &external.entries {
            let part = parse_model_xml(&package.get_part(path)?)?;
            let referenced = part
                .resources
                .get_object(component.objectid)
                .and_then(|o| o.mesh.as_ref())
                .ok_or_else(|| {
                    Error::InvalidModel(format!(
                        "component references object {} missing from {}",
                        component.objectid, path
                    ))
                })?;

            let mut placed = referenced.clone();
            if let Some(transform) = component.transform {
                for vertex in &mut placed.vertices {
                    *vertex = transform.apply(vertex);
                }
            }
            mesh.append(&placed);
        }
    }

    if mesh.vertices.is_empty() {
        return Err(Error::InvalidModel(
            "package contains no mesh geometry".to_string(),
        ));
    }
    Ok(mesh)
}

fn concat_meshes(model: &Model) -> Mesh {
    let mut mesh = Mesh::new();
    for object in model.mesh_objects() {
        if let Some(part) = &object.mesh {
            mesh.append(part);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn package(entries: &[(&str, &str)]) -> Package<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        Package::open(zip.finish().unwrap()).unwrap()
    }

    const TWO_OBJECTS: &str = r#"<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1"><mesh>
      <vertices><vertex x="0" y="0" z="0"/><vertex x="1" y="0" z="0"/><vertex x="0" y="1" z="0"/></vertices>
      <triangles><triangle v1="0" v2="1" v3="2"/></triangles>
    </mesh></object>
    <object id="2"><mesh>
      <vertices><vertex x="5" y="5" z="1"/><vertex x="6" y="5" z="1"/><vertex x="5" y="6" z="1"/></vertices>
      <triangles><triangle v1="0" v2="1" v3="2"/></triangles>
    </mesh></object>
  </resources>
  <build><item objectid="1"/><item objectid="2"/></build>
</model>"#;

    #[test]
    fn test_auto_filament_cycles() {
        let slots: Vec<u8> = (0..6).map(|i| resolve_filament(0, i)).collect();
        assert_eq!(slots, vec![1, 2, 3, 4, 1, 2]);
        assert_eq!(resolve_filament(3, 0), 3);
    }

    #[test]
    fn test_mesh_objects_are_concatenated() {
        let mut pkg = package(&[("3D/3dmodel.model", TWO_OBJECTS)]);
        let mesh = package_mesh(&mut pkg).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.triangles[1], crate::model::Triangle::new(3, 4, 5));
    }

    #[test]
    fn test_external_components_are_followed() {
        let root = r#"<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02"
  xmlns:p="http://schemas.microsoft.com/3dmanufacturing/production/2015/06" requiredextensions="p">
  <resources>
    <object id="2" type="model">
      <components>
        <component p:path="/3D/Objects/object_1.model" objectid="1" transform="1 0 0 0 1 0 0 0 1 0 0 10"/>
      </components>
    </object>
  </resources>
  <build><item objectid="2"/></build>
</model>"#;
        let mut pkg = package(&[
            ("3D/3dmodel.model", root),
            ("3D/Objects/object_1.model", TWO_OBJECTS),
        ]);

        let mesh = package_mesh(&mut pkg).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[0].z, 10.0);
    }

    #[test]
    fn test_package_without_geometry_is_rejected() {
        let empty = r#"<model xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02"><resources/><build/></model>"#;
        let mut pkg = package(&[("3D/3dmodel.model", empty)]);
        assert!(matches!(
            package_mesh(&mut pkg),
            Err(Error::InvalidModel(_))
        ));
    }
}
