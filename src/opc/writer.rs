//! Package writing for merged 3MF files

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use log::{debug, info, warn};
use tempfile::NamedTempFile;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::{
    CONTENT_TYPES_PATH, DEFAULT_CONTENT_TYPES, DEFAULT_RELS, MODEL_PATH, Package, RELS_PATH,
    SETTINGS_PATH,
};
use crate::error::{Error, Result};

/// The two documents generated for a merged package
#[derive(Debug, Clone, Copy)]
pub struct PackageContents<'a> {
    /// Serialized `3D/3dmodel.model`
    pub model_xml: &'a str,
    /// Serialized `Metadata/model_settings.config`
    pub settings_xml: &'a str,
}

/// Write a merged package to `writer`
///
/// The model and settings documents are written first, then every other entry
/// of `template` is copied raw. The model goes to the template's root model
/// part, so its relationships keep pointing at the merged model, and the
/// template's own model and settings entries are skipped. A package manifest
/// or root relationships file missing from the template is replaced by a
/// default one.
///
/// Returns the writer after finishing the ZIP archive.
pub fn write_package<W, T>(
    writer: W,
    contents: PackageContents<'_>,
    template: Option<&mut Package<T>>,
) -> Result<W>
where
    W: Write + Seek,
    T: Read + Seek,
{
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    let model_path = template
        .as_deref()
        .map_or(MODEL_PATH, |package| package.model_path())
        .to_string();
    write_entry(&mut zip, options, &model_path, contents.model_xml)?;
    write_entry(&mut zip, options, SETTINGS_PATH, contents.settings_xml)?;

    let copied = match template {
        Some(package) => {
            package.copy_entries_into(&mut zip, &[model_path.as_str(), SETTINGS_PATH])?
        }
        None => Vec::new(),
    };
    debug!("Copied {} template entries", copied.len());

    for (path, fallback) in [
        (CONTENT_TYPES_PATH, DEFAULT_CONTENT_TYPES),
        (RELS_PATH, DEFAULT_RELS),
    ] {
        if !copied.iter().any(|name| name == path) {
            warn!("Template has no '{}', writing a default one", path);
            write_entry(&mut zip, options, path, fallback)?;
        }
    }

    zip.finish()
        .map_err(|e| Error::xml_write(format!("Failed to finalize ZIP archive: {}", e)))
}

/// Write a merged package to `path`
///
/// The archive is staged in a temporary file in the destination directory
/// and moved into place only once it is complete, so a failed merge never
/// leaves a partial file at `path`.
pub fn write_package_to_path(
    path: &Path,
    contents: PackageContents<'_>,
    template: Option<&Path>,
) -> Result<()> {
    let mut template = match template {
        Some(template_path) => {
            let file = File::open(template_path).map_err(|e| {
                Error::InvalidFormat(format!(
                    "Cannot open template {}: {}",
                    template_path.display(),
                    e
                ))
            })?;
            Some(Package::open(file)?)
        }
        None => None,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;

    write_package(staged.as_file_mut(), contents, template.as_mut())?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| Error::Io(e.error))?;

    info!("Wrote merged package to {}", path.display());
    Ok(())
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    name: &str,
    content: &str,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| Error::xml_write(format!("Failed to create entry '{}': {}", name, e)))?;
    zip.write_all(content.as_bytes())
        .map_err(|e| Error::xml_write(format!("Failed to write entry '{}': {}", name, e)))?;
    Ok(())
}
