//! Merge description and options
//!
//! A merge is described as plates of objects of parts ([`MergeSpec`]) plus a
//! handful of layout and output settings ([`MergeOptions`]). Both derive
//! serde traits, so a YAML or JSON loader can produce them directly; this
//! crate does no file-format loading of its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::packing::{DEFAULT_MAX_ROW_WIDTH, PackingAlgorithm};

/// Default spacing between packed objects (mm)
pub const DEFAULT_MARGIN: f64 = 10.0;

/// Default plate width, also the shelf row limit (mm)
pub const DEFAULT_PLATE_WIDTH: f64 = DEFAULT_MAX_ROW_WIDTH;

/// Highest filament slot; 0 means "assign automatically"
pub const MAX_FILAMENT_SLOT: u8 = 4;

/// Name of the single plate used when no plates are given
pub const DEFAULT_PLATE_NAME: &str = "Plate 1";

/// Application name written to the model metadata
pub const DEFAULT_APPLICATION: &str = "threemf-merge";

fn default_true() -> bool {
    true
}

fn default_count() -> usize {
    1
}

/// A value per axis, used for rotations (degrees) and positions (mm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Axes {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Axes {
    /// Create a new value
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One mesh-bearing source package and how to place it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    /// Display name
    pub name: String,
    /// Path to the source 3MF package
    pub file: PathBuf,
    /// Filament slot 1-4, or 0 for automatic assignment
    #[serde(default)]
    pub filament: u8,
    /// Rotation in degrees, applied Z then Y then X
    #[serde(default)]
    pub rotation: Axes,
    /// Position offset relative to the object (mm)
    #[serde(default)]
    pub position: Axes,
}

impl PartSpec {
    /// Create a part with automatic filament and no rotation or offset
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            filament: 0,
            rotation: Axes::default(),
            position: Axes::default(),
        }
    }

    /// Set the filament slot
    pub fn with_filament(mut self, filament: u8) -> Self {
        self.filament = filament;
        self
    }

    /// Set the rotation in degrees
    pub fn with_rotation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.rotation = Axes::new(x, y, z);
        self
    }

    /// Set the position offset in mm
    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Axes::new(x, y, z);
        self
    }
}

/// A named object made of one or more parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Object name
    pub name: String,
    /// Parts in order
    pub parts: Vec<PartSpec>,
    /// Drop the object onto the plate so its lowest point is at Z = 0
    #[serde(default = "default_true")]
    pub normalize_position: bool,
    /// Number of independent copies to place
    #[serde(default = "default_count")]
    pub count: usize,
}

impl ObjectSpec {
    /// Create an object placed once and normalized to the ground
    pub fn new(name: impl Into<String>, parts: Vec<PartSpec>) -> Self {
        Self {
            name: name.into(),
            parts,
            normalize_position: true,
            count: 1,
        }
    }

    /// Keep the parts' own Z positions instead of dropping them to Z = 0
    pub fn with_normalize_position(mut self, normalize: bool) -> Self {
        self.normalize_position = normalize;
        self
    }

    /// Place `count` copies
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// A print plate holding objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateSpec {
    /// Plate name, "Plate <n>" when omitted
    #[serde(default)]
    pub name: Option<String>,
    /// Objects on this plate
    pub objects: Vec<ObjectSpec>,
}

impl PlateSpec {
    /// Create a plate
    pub fn new(name: impl Into<String>, objects: Vec<ObjectSpec>) -> Self {
        Self {
            name: Some(name.into()),
            objects,
        }
    }
}

/// Everything that goes into the merged package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSpec {
    /// Plates in order; the first plate's first part is the default template
    pub plates: Vec<PlateSpec>,
}

impl MergeSpec {
    /// A single plate holding the given objects
    pub fn single_plate(objects: Vec<ObjectSpec>) -> Self {
        Self {
            plates: vec![PlateSpec::new(DEFAULT_PLATE_NAME, objects)],
        }
    }

    /// One object per part, named after the part
    pub fn from_parts(parts: Vec<PartSpec>) -> Self {
        let objects = parts
            .into_iter()
            .map(|part| ObjectSpec::new(part.name.clone(), vec![part]))
            .collect();
        Self::single_plate(objects)
    }

    /// Group parts named `object/part` into objects by the prefix before `/`
    ///
    /// Objects keep the order of their first part; a name without `/` forms
    /// its own object.
    pub fn from_named_parts(parts: Vec<PartSpec>) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut groups: BTreeMap<String, Vec<PartSpec>> = BTreeMap::new();

        for mut part in parts {
            let (object, part_name) = match part.name.split_once('/') {
                Some((object, rest)) => (object.to_string(), rest.to_string()),
                None => (part.name.clone(), part.name.clone()),
            };
            part.name = part_name;
            if !groups.contains_key(&object) {
                order.push(object.clone());
            }
            groups.entry(object).or_default().push(part);
        }

        let objects = order
            .into_iter()
            .filter_map(|name| {
                groups
                    .remove(&name)
                    .map(|parts| ObjectSpec::new(name, parts))
            })
            .collect();
        Self::single_plate(objects)
    }

    /// Check the description for errors that would otherwise surface mid-merge
    pub fn validate(&self) -> Result<()> {
        if self.plates.is_empty() {
            return Err(Error::invalid_config(
                "plates",
                "at least one plate must be defined",
            ));
        }

        for (plate_index, plate) in self.plates.iter().enumerate() {
            let plate_location = format!("plates[{}]", plate_index);
            if plate.objects.is_empty() {
                return Err(Error::invalid_config(
                    &plate_location,
                    "at least one object must be defined",
                ));
            }

            for (object_index, object) in plate.objects.iter().enumerate() {
                let location = format!("{}.objects[{}]", plate_location, object_index);
                if object.name.trim().is_empty() {
                    return Err(Error::invalid_config(&location, "name is required"));
                }
                if object.parts.is_empty() {
                    return Err(Error::invalid_config(
                        &location,
                        &format!("object '{}' has no parts", object.name),
                    ));
                }

                for (part_index, part) in object.parts.iter().enumerate() {
                    let location = format!("{}.parts[{}]", location, part_index);
                    if part.name.trim().is_empty() {
                        return Err(Error::invalid_config(&location, "name is required"));
                    }
                    if part.file.as_os_str().is_empty() {
                        return Err(Error::invalid_config(&location, "file is required"));
                    }
                    if part.filament > MAX_FILAMENT_SLOT {
                        return Err(Error::invalid_config(
                            &location,
                            &format!(
                                "filament must be 0-{} (0 = auto), got {}",
                                MAX_FILAMENT_SLOT, part.filament
                            ),
                        ));
                    }
                    if !part.rotation.is_finite() || !part.position.is_finite() {
                        return Err(Error::invalid_config(
                            &location,
                            "rotation and position must be finite numbers",
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Make relative part paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for part in self.parts_mut() {
            if part.file.is_relative() {
                part.file = base.join(&part.file);
            }
        }
    }

    /// Expand repeat counts into independent objects
    ///
    /// An object with `count > 1` becomes objects named `<name>_1`,
    /// `<name>_2`, ... Part names of multi-part objects become
    /// `<object>/<part>`; a single part takes the object's name. Unnamed
    /// plates are named `Plate <n>`.
    pub fn expand(&self) -> Self {
        let plates = self
            .plates
            .iter()
            .enumerate()
            .map(|(plate_index, plate)| {
                let name = plate
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("Plate {}", plate_index + 1));
                let objects = plate.objects.iter().flat_map(expand_object).collect();
                PlateSpec {
                    name: Some(name),
                    objects,
                }
            })
            .collect();
        Self { plates }
    }

    /// The part whose package provides untouched entries by default
    pub fn first_part(&self) -> Option<&PartSpec> {
        self.parts().next()
    }

    /// All parts in plate, object, part order
    pub fn parts(&self) -> impl Iterator<Item = &PartSpec> {
        self.plates
            .iter()
            .flat_map(|p| p.objects.iter())
            .flat_map(|o| o.parts.iter())
    }

    fn parts_mut(&mut self) -> impl Iterator<Item = &mut PartSpec> {
        self.plates
            .iter_mut()
            .flat_map(|p| p.objects.iter_mut())
            .flat_map(|o| o.parts.iter_mut())
    }
}

fn expand_object(object: &ObjectSpec) -> Vec<ObjectSpec> {
    let count = object.count.max(1);
    (1..=count)
        .map(|copy| {
            let name = if count > 1 {
                format!("{}_{}", object.name, copy)
            } else {
                object.name.clone()
            };
            let multi_part = object.parts.len() > 1;
            let parts = object
                .parts
                .iter()
                .map(|part| PartSpec {
                    name: if multi_part {
                        format!("{}/{}", name, part.name)
                    } else {
                        name.clone()
                    },
                    ..part.clone()
                })
                .collect();
            ObjectSpec {
                name,
                parts,
                normalize_position: object.normalize_position,
                count: 1,
            }
        })
        .collect()
}

/// Layout and output settings
///
/// # Example
///
/// ```
/// use threemf_merge::{MergeOptions, PackingAlgorithm};
///
/// let options = MergeOptions::new()
///     .with_margin(5.0)
///     .with_algorithm(PackingAlgorithm::Guillotine)
///     .with_date("2024-01-31");
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Spacing between packed objects (mm)
    pub margin: f64,
    /// Packing algorithm
    pub algorithm: PackingAlgorithm,
    /// Plate width (mm); plates are laid side by side this far apart
    pub plate_width: Option<f64>,
    /// Package whose other entries are copied into the output; the first
    /// part's package when unset
    pub template: Option<PathBuf>,
    /// Creation and modification date, `YYYY-MM-DD`; today when unset
    pub date: Option<String>,
    /// Application name recorded in the model metadata
    pub application: String,
}

impl MergeOptions {
    /// Default options
    pub fn new() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            algorithm: PackingAlgorithm::Shelf,
            plate_width: None,
            template: None,
            date: None,
            application: DEFAULT_APPLICATION.to_string(),
        }
    }

    /// Set the spacing between packed objects
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Select the packing algorithm
    pub fn with_algorithm(mut self, algorithm: PackingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the plate width
    pub fn with_plate_width(mut self, width: f64) -> Self {
        self.plate_width = Some(width);
        self
    }

    /// Copy untouched entries from this package instead of the first part's
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Fix the date written to the metadata
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Plate width in effect
    pub fn effective_plate_width(&self) -> f64 {
        self.plate_width.unwrap_or(DEFAULT_PLATE_WIDTH)
    }

    /// Check the options
    pub fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(Error::invalid_config(
                "margin",
                &format!("must be a non-negative number, got {}", self.margin),
            ));
        }
        if let Some(width) = self.plate_width
            && (!width.is_finite() || width <= 0.0)
        {
            return Err(Error::invalid_config(
                "plate_width",
                &format!("must be a positive number, got {}", width),
            ));
        }
        if let Some(date) = &self.date
            && !is_iso_date(date)
        {
            return Err(Error::invalid_config(
                "date",
                &format!("expected YYYY-MM-DD, got '{}'", date),
            ));
        }
        Ok(())
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn is_iso_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
