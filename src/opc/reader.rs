//! Package reading

use std::io::{Read, Seek, Write};

use log::debug;
use zip::{ZipArchive, ZipWriter};

use super::relationships::find_model_target;
use super::{MODEL_PATH, Package, RELS_PATH, entry_name};
use crate::error::{Error, Result};

impl<R: Read + Seek> Package<R> {
    /// Open a 3MF package from a reader
    ///
    /// The root model part is located through `_rels/.rels` when the package
    /// has one, and falls back to `3D/3dmodel.model` otherwise. Opening fails
    /// when the resolved part does not exist.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut package = Self {
            archive,
            model_path: MODEL_PATH.to_string(),
        };

        if package.has_file(RELS_PATH) {
            let rels = package.get_file(RELS_PATH)?;
            if let Some(target) = find_model_target(&rels)? {
                package.model_path = entry_name(&target).to_string();
            }
        }

        let model_path = package.model_path.clone();
        if !package.has_file(&model_path) {
            return Err(Error::MissingFile(model_path));
        }

        debug!(
            "Opened package with {} entries, root model '{}'",
            package.len(),
            package.model_path
        );
        Ok(package)
    }

    /// Entry name of the root model part
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Get the root model document
    pub fn get_model(&mut self) -> Result<String> {
        let path = self.model_path.clone();
        self.get_file(&path)
    }

    /// Get a model part by its OPC part name (leading slash optional)
    pub fn get_part(&mut self, part_name: &str) -> Result<String> {
        self.get_file(entry_name(part_name))
    }

    /// Get a file by name from the archive
    pub fn get_file(&mut self, name: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Get a file as binary data from the archive
    pub fn get_file_binary(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Check if a file exists in the archive
    pub fn has_file(&mut self, name: &str) -> bool {
        self.archive.by_name(name).is_ok()
    }

    /// Get the number of files in the archive
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the archive is empty
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// List all file names in the archive
    pub fn file_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Copy every entry not listed in `skip` into `zip` without recompressing
    ///
    /// Returns the names of the copied entries in archive order.
    pub(crate) fn copy_entries_into<W: Write + Seek>(
        &mut self,
        zip: &mut ZipWriter<W>,
        skip: &[&str],
    ) -> Result<Vec<String>> {
        let mut copied = Vec::new();
        for index in 0..self.archive.len() {
            let file = self.archive.by_index_raw(index)?;
            let name = file.name().to_string();
            if skip.contains(&name.as_str()) {
                continue;
            }
            zip.raw_copy_file(file)
                .map_err(|e| Error::xml_write(format!("Failed to copy entry '{}': {}", name, e)))?;
            copied.push(name);
        }
        Ok(copied)
    }
}
