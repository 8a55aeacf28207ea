//! Merging source packages into one multi-object package
//!
//! The merge is a linear pipeline of plain functions sharing one immutable
//! `MergeContext`:
//!
//! 1. ingest: read every part's package, assign IDs, resolve filaments and
//!    bake rotations into the vertices
//! 2. layout: drop groups to the ground, measure their footprints and pack
//!    each plate
//! 3. assemble: build the model and settings documents
//!
//! [`merge_to_file`] additionally serializes both documents and writes them
//! into a copy of the template package.

mod assemble;
mod ingest;
mod layout;

use std::path::{Path, PathBuf};

use log::info;

use crate::config::{Axes, MergeOptions, MergeSpec};
use crate::error::{Error, Result};
use crate::model::{Mesh, Model, SettingsDocument};
use crate::opc::{PackageContents, write_package_to_path};
use crate::packing::PackingAlgorithm;
use crate::writer::{model_to_string, settings_to_string};

pub use ingest::read_mesh;

/// Settings shared by every pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MergeContext {
    pub margin: f64,
    pub algorithm: PackingAlgorithm,
    pub plate_width: f64,
    pub application: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

impl MergeContext {
    fn new(options: &MergeOptions) -> Self {
        Self {
            margin: options.margin,
            algorithm: options.algorithm,
            plate_width: options.effective_plate_width(),
            application: options.application.clone(),
            date: options.date.clone().unwrap_or_else(assemble::today),
        }
    }
}

/// One ingested part
#[derive(Debug, Clone)]
pub(crate) struct MeshPart {
    pub name: String,
    pub source_file: PathBuf,
    /// Object ID in the merged model
    pub id: usize,
    /// Resolved filament slot, 1-4
    pub filament: u8,
    pub position: Axes,
    pub mesh: Mesh,
    /// Lowest Z of the mesh after rotation
    pub min_z: f64,
}

/// Parts that are placed together as one object
#[derive(Debug, Clone)]
pub(crate) struct ObjectGroup {
    pub name: String,
    pub normalize: bool,
    pub parts: Vec<MeshPart>,
}

#[derive(Debug, Clone)]
pub(crate) struct Plate {
    pub name: String,
    pub groups: Vec<ObjectGroup>,
}

/// The merged documents
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutput {
    /// Content of `3D/3dmodel.model`
    pub model: Model,
    /// Content of `Metadata/model_settings.config`
    pub settings: SettingsDocument,
}

/// Merge the parts described by `spec`
///
/// Fails before producing anything when the description or options are
/// invalid or when any source package cannot be read.
pub fn merge(spec: &MergeSpec, options: &MergeOptions) -> Result<MergeOutput> {
    options.validate()?;
    spec.validate()?;

    let spec = spec.expand();
    let context = MergeContext::new(options);

    let plates = ingest::ingest(&spec)?;
    let placed = layout::layout(&context, plates);
    let output = assemble::assemble(&context, placed);

    info!(
        "Merged {} objects into {} build items on {} plate(s)",
        output.model.resources.objects.len(),
        output.model.build.items.len(),
        output.settings.plates.len()
    );
    Ok(output)
}

/// Merge and write the result to `output`
///
/// Entries other than the model and settings documents are copied from
/// `options.template`, or from the first part's package when no template is
/// set. The file at `output` is only replaced once the package is complete.
pub fn merge_to_file(spec: &MergeSpec, options: &MergeOptions, output: &Path) -> Result<MergeOutput> {
    let merged = merge(spec, options)?;

    let template = match &options.template {
        Some(path) => path.clone(),
        None => spec
            .first_part()
            .map(|p| p.file.clone())
            .ok_or_else(|| Error::invalid_config("plates", "no parts to take a template from"))?,
    };

    let model_xml = model_to_string(&merged.model)?;
    let settings_xml = settings_to_string(&merged.settings)?;
    write_package_to_path(
        output,
        PackageContents {
            model_xml: &model_xml,
            settings_xml: &settings_xml,
        },
        Some(&template),
    )?;

    Ok(merged)
}
