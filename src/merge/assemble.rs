//! Building the merged model and settings documents

use chrono::Utc;

use super::layout::PlacedPlate;
use super::{MergeContext, MergeOutput};
use crate::geometry::Transform;
use crate::model::*;

/// Value of the `BambuStudio:3mfVersion` metadata entry
pub(crate) const BAMBU_3MF_VERSION: &str = "1";

/// Turn placed plates into the two output documents
///
/// Mesh objects keep their ingestion IDs and come first in the resources.
/// Each multi-part group adds one parent object whose ID follows every mesh
/// ID. Build items follow plate order, then group order.
pub(super) fn assemble(context: &MergeContext, plates: Vec<PlacedPlate>) -> MergeOutput {
    let mut model = Model::new();
    model.declared_extensions = vec![Extension::Production, Extension::BambuStudio];
    model.required_extensions = vec![Extension::Production];
    model.metadata = vec![
        MetadataEntry::new("Application", context.application.as_str()),
        MetadataEntry::new("BambuStudio:3mfVersion", BAMBU_3MF_VERSION),
        MetadataEntry::new("CreationDate", context.date.as_str()),
        MetadataEntry::new("ModificationDate", context.date.as_str()),
    ];

    let mesh_count: usize = plates
        .iter()
        .flat_map(|p| &p.groups)
        .map(|g| g.group.parts.len())
        .sum();
    let mut next_parent_id = mesh_count + 1;
    let mut parents = Vec::new();
    let mut settings = SettingsDocument::new();
    let mut group_index = 0;

    for (plate_index, plate) in plates.into_iter().enumerate() {
        let mut instances = Vec::with_capacity(plate.groups.len());

        for placed in plate.groups {
            let group = placed.group;
            let [x, y] = placed.origin;

            let (object_id, transform) = match group.parts.as_slice() {
                [part] => (
                    part.id,
                    Transform::translation(
                        x + part.position.x,
                        y + part.position.y,
                        part.position.z,
                    ),
                ),
                parts => {
                    let components = parts
                        .iter()
                        .map(|p| {
                            Component::with_transform(
                                p.id,
                                Transform::translation(p.position.x, p.position.y, p.position.z),
                            )
                        })
                        .collect();
                    let id = next_parent_id;
                    next_parent_id += 1;
                    parents.push(Object::with_components(id, group.name.clone(), components));
                    (id, Transform::translation(x, y, 0.0))
                }
            };

            model.build.items.push(BuildItem::placed(object_id, transform));
            instances.push(ModelInstance {
                object_id,
                instance_id: 0,
                identify_id: object_id,
            });
            settings.assemble.push(AssembleItem {
                object_id,
                instance_id: 0,
                transform,
                offset: [0.0; 3],
            });

            let settings_parts: Vec<SettingsPart> = group
                .parts
                .iter()
                .enumerate()
                .map(|(volume, part)| SettingsPart {
                    id: part.id,
                    subtype: NORMAL_PART.to_string(),
                    name: part.name.clone(),
                    matrix: IDENTITY_MATRIX.to_string(),
                    source_file: part
                        .source_file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source_object_id: group_index,
                    source_volume_id: volume,
                    extruder: part.filament,
                    mesh_stat: MeshStat::with_faces(part.mesh.face_count()),
                })
                .collect();
            settings.objects.push(SettingsObject {
                id: object_id,
                name: group.name.clone(),
                extruder: group.parts.first().map_or(1, |p| p.filament),
                face_count: settings_parts.iter().map(|p| p.mesh_stat.face_count).sum(),
                parts: settings_parts,
            });

            for part in group.parts {
                model
                    .resources
                    .objects
                    .push(Object::with_mesh(part.id, part.name, part.mesh));
            }
            group_index += 1;
        }

        settings.plates.push(SettingsPlate {
            plater_id: plate_index + 1,
            plater_name: plate.name,
            locked: false,
            filament_map_mode: FILAMENT_MAP_MODE.to_string(),
            instances,
        });
    }

    model.resources.objects.sort_by_key(|o| o.id);
    model.resources.objects.extend(parents);

    MergeOutput { model, settings }
}

/// Today's UTC date as `YYYY-MM-DD`
pub(crate) fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
