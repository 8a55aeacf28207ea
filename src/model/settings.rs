//! Slicer project settings stored in `Metadata/model_settings.config`
//!
//! The settings document mirrors the model document: every top-level object
//! in the build appears as a [`SettingsObject`], and every mesh part below it
//! appears as a [`SettingsPart`] whose ID equals the mesh object's ID.

use crate::geometry::Transform;

/// Identity 4x4 matrix recorded on each part
pub const IDENTITY_MATRIX: &str = "1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1";

/// Part subtype for regular printable geometry
pub const NORMAL_PART: &str = "normal_part";

/// Default filament mapping mode of a plate
pub const FILAMENT_MAP_MODE: &str = "Auto For Flush";

/// Mesh repair statistics attached to a part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStat {
    /// Number of triangles
    pub face_count: usize,
    /// Edges fixed during repair
    pub edges_fixed: usize,
    /// Degenerate facets found
    pub degenerate_facets: usize,
    /// Facets removed
    pub facets_removed: usize,
    /// Facets reversed
    pub facets_reversed: usize,
    /// Backwards edges found
    pub backwards_edges: usize,
}

impl MeshStat {
    /// Statistics for an unrepaired mesh with `face_count` triangles
    pub fn with_faces(face_count: usize) -> Self {
        Self {
            face_count,
            ..Self::default()
        }
    }
}

/// One volume of a settings object
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPart {
    /// Equals the ID of the mesh object in the model document
    pub id: usize,
    /// Part subtype, normally [`NORMAL_PART`]
    pub subtype: String,
    /// Display name
    pub name: String,
    /// Local matrix as 16 space-separated numbers
    pub matrix: String,
    /// File the part was merged from
    pub source_file: String,
    /// Index of the owning object in the merged output
    pub source_object_id: usize,
    /// Index of this part inside its object
    pub source_volume_id: usize,
    /// Filament slot (1-4)
    pub extruder: u8,
    /// Mesh statistics
    pub mesh_stat: MeshStat,
}

/// A top-level object in the settings document
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsObject {
    /// Object ID, equal to the build item's object ID
    pub id: usize,
    /// Display name
    pub name: String,
    /// Default filament slot of the object
    pub extruder: u8,
    /// Sum of the parts' face counts
    pub face_count: usize,
    /// Parts in volume order
    pub parts: Vec<SettingsPart>,
}

/// Reference from a plate to an object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInstance {
    /// Object ID
    pub object_id: usize,
    /// Instance index, always 0 for merged output
    pub instance_id: usize,
    /// Identifier used by the slicer to match instances
    pub identify_id: usize,
}

/// A print plate
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsPlate {
    /// 1-based plate number
    pub plater_id: usize,
    /// Plate display name
    pub plater_name: String,
    /// Whether the plate is locked in the slicer
    pub locked: bool,
    /// Filament mapping mode
    pub filament_map_mode: String,
    /// Objects placed on this plate
    pub instances: Vec<ModelInstance>,
}

/// Placement of one build item
#[derive(Debug, Clone, PartialEq)]
pub struct AssembleItem {
    /// Object ID
    pub object_id: usize,
    /// Instance index
    pub instance_id: usize,
    /// Final placement transform, equal to the build item's
    pub transform: Transform,
    /// Assembly offset, always `0 0 0` for merged output
    pub offset: [f64; 3],
}

/// The complete settings document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    /// Objects in build order
    pub objects: Vec<SettingsObject>,
    /// Plates in order
    pub plates: Vec<SettingsPlate>,
    /// One entry per build item
    pub assemble: Vec<AssembleItem>,
}

impl SettingsDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an object by ID
    pub fn get_object(&self, id: usize) -> Option<&SettingsObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// All part IDs, in document order
    pub fn part_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .flat_map(|o| o.parts.iter().map(|p| p.id))
    }

    /// The plate an object instance is placed on
    pub fn plate_of(&self, object_id: usize) -> Option<&SettingsPlate> {
        self.plates
            .iter()
            .find(|p| p.instances.iter().any(|i| i.object_id == object_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: usize) -> SettingsPart {
        SettingsPart {
            id,
            subtype: NORMAL_PART.to_string(),
            name: format!("part{}", id),
            matrix: IDENTITY_MATRIX.to_string(),
            source_file: "a.3mf".to_string(),
            source_object_id: 0,
            source_volume_id: 0,
            extruder: 1,
            mesh_stat: MeshStat::with_faces(12),
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let doc = SettingsDocument {
            objects: vec![SettingsObject {
                id: 3,
                name: "box".to_string(),
                extruder: 1,
                face_count: 24,
                parts: vec![part(1), part(2)],
            }],
            plates: vec![SettingsPlate {
                plater_id: 1,
                plater_name: "Plate 1".to_string(),
                locked: false,
                filament_map_mode: FILAMENT_MAP_MODE.to_string(),
                instances: vec![ModelInstance {
                    object_id: 3,
                    instance_id: 0,
                    identify_id: 3,
                }],
            }],
            assemble: Vec::new(),
        };

        assert_eq!(doc.part_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(doc.get_object(3).map(|o| o.parts.len()), Some(2));
        assert_eq!(doc.plate_of(3).map(|p| p.plater_id), Some(1));
        assert!(doc.plate_of(1).is_none());
    }
}
