//! Reading a merged package back for inspection
//!
//! [`inspect`] parses both generated documents of a package and exposes the
//! object hierarchy with filament slots and placement offsets, which is what
//! is needed to check a merge result by eye or in a test.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::Result;
use crate::geometry::Transform;
use crate::model::{Model, SettingsDocument};
use crate::opc::{Package, SETTINGS_PATH};
use crate::parser::{parse_model_xml, parse_settings_xml};

/// A package's model and, when present, its settings document
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    /// Parsed root model
    pub model: Model,
    /// Parsed `Metadata/model_settings.config`
    pub settings: Option<SettingsDocument>,
}

/// One build item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    /// Referenced object
    pub object_id: usize,
    /// Name of the referenced object
    pub name: Option<String>,
    /// `false` only when the item is explicitly marked non-printable
    pub printable: bool,
    /// Translation of the item, `None` when absent or zero
    pub offset: Option<[f64; 3]>,
    /// Name of the settings plate holding the item
    pub plate: Option<String>,
}

/// A component of a top-level object
#[derive(Debug, Clone, PartialEq)]
pub struct PartSummary {
    /// Referenced object
    pub id: usize,
    /// Settings part name, falling back to the object name
    pub name: Option<String>,
    /// Filament slot from the settings part
    pub filament: Option<u8>,
    /// Translation of the component, `None` when absent or zero
    pub offset: Option<[f64; 3]>,
}

/// A top-level object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    /// Object ID
    pub id: usize,
    /// Object name
    pub name: Option<String>,
    /// Filament slot from the settings object
    pub filament: Option<u8>,
    /// Whether the object carries geometry itself
    pub has_mesh: bool,
    /// Components in document order
    pub parts: Vec<PartSummary>,
}

/// Read a package
pub fn inspect<R: Read + Seek>(reader: R) -> Result<Inspection> {
    let mut package = Package::open(reader)?;
    let model = parse_model_xml(&package.get_model()?)?;
    let settings = if package.has_file(SETTINGS_PATH) {
        Some(parse_settings_xml(&package.get_file(SETTINGS_PATH)?)?)
    } else {
        None
    };
    Ok(Inspection { model, settings })
}

/// Read a package from disk
pub fn inspect_file(path: &Path) -> Result<Inspection> {
    inspect(File::open(path)?)
}

fn nonzero_offset(transform: Option<&Transform>) -> Option<[f64; 3]> {
    transform
        .map(|t| t.offset())
        .filter(|o| o.iter().any(|v| *v != 0.0))
}

impl Inspection {
    /// Build items in order
    pub fn items(&self) -> Vec<ItemSummary> {
        self.model
            .build
            .items
            .iter()
            .map(|item| ItemSummary {
                object_id: item.objectid,
                name: self
                    .model
                    .resources
                    .get_object(item.objectid)
                    .and_then(|o| o.name.clone()),
                printable: item.printable != Some(false),
                offset: nonzero_offset(item.transform.as_ref()),
                plate: self
                    .settings
                    .as_ref()
                    .and_then(|s| s.plate_of(item.objectid))
                    .map(|p| p.plater_name.clone()),
            })
            .collect()
    }

    /// Objects that are not only used as components of another object
    pub fn objects(&self) -> Vec<ObjectSummary> {
        let component_ids: HashSet<usize> = self
            .model
            .resources
            .objects
            .iter()
            .flat_map(|o| o.components.iter().map(|c| c.objectid))
            .collect();

        self.model
            .resources
            .objects
            .iter()
            .filter(|o| !o.components.is_empty() || !component_ids.contains(&o.id))
            .map(|object| ObjectSummary {
                id: object.id,
                name: object.name.clone(),
                filament: self
                    .settings
                    .as_ref()
                    .and_then(|s| s.get_object(object.id))
                    .map(|s| s.extruder),
                has_mesh: object.mesh.is_some(),
                parts: object
                    .components
                    .iter()
                    .map(|component| {
                        let settings_part = self.settings.as_ref().and_then(|s| {
                            s.objects
                                .iter()
                                .flat_map(|o| &o.parts)
                                .find(|p| p.id == component.objectid)
                        });
                        PartSummary {
                            id: component.objectid,
                            name: settings_part.map(|p| p.name.clone()).or_else(|| {
                                self.model
                                    .resources
                                    .get_object(component.objectid)
                                    .and_then(|o| o.name.clone())
                            }),
                            filament: settings_part.map(|p| p.extruder),
                            offset: nonzero_offset(component.transform.as_ref()),
                        }
                    })
                    .collect(),
            })
            .collect()
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unit: {}", self.model.unit)?;
        writeln!(f, "Language: {}", self.model.lang)?;
        for entry in &self.model.metadata {
            writeln!(f, "{}: {}", entry.name, entry.value)?;
        }

        writeln!(f, "Build items:")?;
        for (index, item) in self.items().iter().enumerate() {
            write!(
                f,
                "  #{} object {}: {} (printable: {})",
                index + 1,
                item.object_id,
                item.name.as_deref().unwrap_or("(unnamed)"),
                if item.printable { "yes" } else { "no" }
            )?;
            if let Some([x, y, z]) = item.offset {
                write!(f, " at [{:.2}, {:.2}, {:.2}]", x, y, z)?;
            }
            if let Some(plate) = &item.plate {
                write!(f, " on '{}'", plate)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Objects:")?;
        for object in self.objects() {
            write!(
                f,
                "  {} (ID: {})",
                object.name.as_deref().unwrap_or("(unnamed)"),
                object.id
            )?;
            if !object.parts.is_empty() {
                write!(f, " - {} part(s)", object.parts.len())?;
            }
            if let Some(filament) = object.filament {
                write!(f, " (filament: {})", filament)?;
            }
            if object.has_mesh {
                write!(f, " [mesh]")?;
            }
            writeln!(f)?;

            for part in &object.parts {
                write!(
                    f,
                    "    - {} (ID: {})",
                    part.name.as_deref().unwrap_or("(unnamed)"),
                    part.id
                )?;
                if let Some(filament) = part.filament {
                    write!(f, " (filament: {})", filament)?;
                }
                if let Some([x, y, z]) = part.offset {
                    write!(f, " [offset: {:.2}, {:.2}, {:.2}]", x, y, z)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
