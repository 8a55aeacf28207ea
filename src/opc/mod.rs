//! OPC (Open Packaging Conventions) handling for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard. Source packages are
//! read through [`Package`]; merged output is assembled by [`write_package`]
//! and [`write_package_to_path`], which copy every template entry they do not
//! generate themselves without recompressing it.

mod content_types;
mod reader;
mod relationships;
mod writer;

use std::io::Read;

use zip::ZipArchive;

pub use content_types::DEFAULT_CONTENT_TYPES;
pub use relationships::{DEFAULT_RELS, MODEL_REL_TYPE};
pub use writer::{PackageContents, write_package, write_package_to_path};

/// Main 3D model file path within the 3MF archive
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Slicer settings file path
pub const SETTINGS_PATH: &str = "Metadata/model_settings.config";

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";

/// An opened 3MF package (ZIP archive)
pub struct Package<R: Read> {
    archive: ZipArchive<R>,
    model_path: String,
}

/// Strip the leading slash of an OPC part name to get the ZIP entry name
pub(crate) fn entry_name(part_name: &str) -> &str {
    part_name.strip_prefix('/').unwrap_or(part_name)
}
