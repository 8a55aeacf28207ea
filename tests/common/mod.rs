//! Shared fixtures for integration tests
//!
//! Source packages are written into a temporary directory the way a slicer
//! export would lay them out: content types, root relationships, the model
//! and a couple of extra entries that a merge must carry over untouched.

#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#;

pub const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// Stand-in thumbnail; only the bytes matter
pub const THUMBNAIL: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3, 4];

pub const THUMBNAIL_PATH: &str = "Metadata/plate_1.png";

/// Settings document of the source package, which a merge replaces
pub const STALE_SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config><object id="99"><metadata key="name" value="stale"/></object></config>"#;

/// Model XML of an axis-aligned box spanning `[0, w] x [0, d] x [z, z + h]`
pub fn box_model(w: f64, d: f64, h: f64, z: f64) -> String {
    let corners = [
        (0.0, 0.0, z),
        (w, 0.0, z),
        (w, d, z),
        (0.0, d, z),
        (0.0, 0.0, z + h),
        (w, 0.0, z + h),
        (w, d, z + h),
        (0.0, d, z + h),
    ];
    let faces = [
        (0, 2, 1),
        (0, 3, 2),
        (4, 5, 6),
        (4, 6, 7),
        (0, 1, 5),
        (0, 5, 4),
        (1, 2, 6),
        (1, 6, 5),
        (2, 3, 7),
        (2, 7, 6),
        (3, 0, 4),
        (3, 4, 7),
    ];

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1" type="model">
      <mesh>
        <vertices>
"#,
    );
    for (x, y, z) in corners {
        xml.push_str(&format!(
            "          <vertex x=\"{}\" y=\"{}\" z=\"{}\"/>\n",
            x, y, z
        ));
    }
    xml.push_str("        </vertices>\n        <triangles>\n");
    for (v1, v2, v3) in faces {
        xml.push_str(&format!(
            "          <triangle v1=\"{}\" v2=\"{}\" v3=\"{}\"/>\n",
            v1, v2, v3
        ));
    }
    xml.push_str(
        r#"        </triangles>
      </mesh>
    </object>
  </resources>
  <build>
    <item objectid="1"/>
  </build>
</model>"#,
    );
    xml
}

/// Write a package holding `model_xml` plus a thumbnail and stale settings
pub fn write_package(dir: &Path, name: &str, model_xml: &str) -> PathBuf {
    write_package_with_thumbnail(dir, name, model_xml, THUMBNAIL)
}

pub fn write_package_with_thumbnail(
    dir: &Path,
    name: &str,
    model_xml: &str,
    thumbnail: &[u8],
) -> PathBuf {
    write_archive(&dir.join(name), RELS, "3D/3dmodel.model", model_xml, thumbnail)
}

/// Write a box package whose root relationship targets `model_entry`
pub fn write_box_at(dir: &Path, name: &str, model_entry: &str, w: f64, d: f64) -> PathBuf {
    let rels = RELS.replace("/3D/3dmodel.model", &format!("/{}", model_entry));
    write_archive(
        &dir.join(name),
        &rels,
        model_entry,
        &box_model(w, d, 10.0, 0.0),
        THUMBNAIL,
    )
}

fn write_archive(
    path: &Path,
    rels: &str,
    model_entry: &str,
    model_xml: &str,
    thumbnail: &[u8],
) -> PathBuf {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();

    let entries: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", rels.as_bytes()),
        (model_entry, model_xml.as_bytes()),
        ("Metadata/model_settings.config", STALE_SETTINGS.as_bytes()),
        (THUMBNAIL_PATH, thumbnail),
    ];
    for (entry, content) in entries {
        zip.start_file(entry, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
    path.to_path_buf()
}

/// Write a box package
pub fn write_box(dir: &Path, name: &str, w: f64, d: f64, h: f64, z: f64) -> PathBuf {
    write_package(dir, name, &box_model(w, d, h, z))
}

/// Raw bytes of one entry
pub fn read_entry(path: &Path, entry: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut file = archive.by_name(entry).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

/// Entry names in archive order
pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}
