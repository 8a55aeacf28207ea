//! # threemf-merge
//!
//! Merges independently produced 3MF mesh packages into one multi-object,
//! multi-plate 3MF package that slicers such as Bambu Studio open with every
//! part laid out, grounded and assigned to a filament slot.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Reads source packages (ZIP/OPC container) and their mesh geometry
//! - Bakes per-part rotations into the vertices and drops groups to the ground
//! - Non-overlapping 2D layout with shelf, guillotine or grid packing
//! - Writes the model and slicer settings documents into a copy of a template
//!   package, replacing the destination only once the archive is complete
//! - Reads merged packages back for inspection
//!
//! ## Example
//!
//! ```no_run
//! use threemf_merge::{MergeOptions, MergeSpec, PartSpec, merge_to_file};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = MergeSpec::from_parts(vec![
//!     PartSpec::new("base", "base.3mf"),
//!     PartSpec::new("lid", "lid.3mf").with_filament(2).with_rotation(180.0, 0.0, 0.0),
//! ]);
//! let merged = merge_to_file(&spec, &MergeOptions::new(), Path::new("merged.3mf"))?;
//!
//! println!("Merged {} objects", merged.model.resources.objects.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod geometry;
pub mod inspect;
pub mod merge;
pub mod model;
pub mod opc;
pub mod packing;
pub mod parser;
pub mod scratch;
pub mod writer;

pub use config::{Axes, MergeOptions, MergeSpec, ObjectSpec, PartSpec, PlateSpec};
pub use error::{Error, ErrorCategory, Result};
pub use geometry::{BoundingBox, Transform};
pub use inspect::{Inspection, inspect, inspect_file};
pub use merge::{MergeOutput, merge, merge_to_file, read_mesh};
pub use model::{
    BuildItem, Component, Extension, Mesh, MetadataEntry, Model, Object, ObjectType,
    SettingsDocument, Triangle, Vertex,
};
pub use packing::{Packer, PackingAlgorithm, Placement, Rect};
pub use scratch::ScratchDir;

use std::io::{Read, Seek};

impl Model {
    /// Parse the root model of a 3MF package
    ///
    /// # Example
    ///
    /// ```no_run
    /// use threemf_merge::Model;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("part.3mf")?;
    /// let model = Model::from_reader(file)?;
    /// println!("{} objects", model.resources.objects.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        parser::parse_3mf(reader)
    }

    /// Serialize to `3D/3dmodel.model` content
    pub fn to_xml_string(&self) -> Result<String> {
        writer::model_to_string(self)
    }
}

impl SettingsDocument {
    /// Parse `Metadata/model_settings.config` content
    pub fn from_xml(xml: &str) -> Result<Self> {
        parser::parse_settings_xml(xml)
    }

    /// Serialize to `Metadata/model_settings.config` content
    pub fn to_xml_string(&self) -> Result<String> {
        writer::settings_to_string(self)
    }
}
