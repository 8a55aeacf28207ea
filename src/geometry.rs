//! Geometry helpers for placing meshes on the build plate
//!
//! This module provides:
//! - Axis-aligned bounding boxes of meshes
//! - The [`Transform`] value used by components, build items and the settings
//!   document, including its canonical 12-number string form
//! - Baking a rotation into mesh vertices and shifting meshes along Z
//!
//! Rotations are given in degrees and applied in Z, Y, X order. Points are
//! transformed as row vectors, `p' = p * M + t`, which is the 3MF convention.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{Mesh, Vertex};

/// Axis-aligned bounding box in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X
    pub min_x: f64,
    /// Minimum Y
    pub min_y: f64,
    /// Minimum Z
    pub min_z: f64,
    /// Maximum X
    pub max_x: f64,
    /// Maximum Y
    pub max_y: f64,
    /// Maximum Z
    pub max_z: f64,
}

impl BoundingBox {
    /// Extent along X
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along Y
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Extent along Z
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// The box shifted in the XY plane
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            min_x: self.min_x + dx,
            max_x: self.max_x + dx,
            min_y: self.min_y + dy,
            max_y: self.max_y + dy,
            ..*self
        }
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            min_z: self.min_z.min(other.min_z),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            max_z: self.max_z.max(other.max_z),
        }
    }
}

/// Compute the bounding box of a mesh
///
/// Fails if the mesh has no vertices or any coordinate is NaN or infinite.
pub fn bounding_box(mesh: &Mesh) -> Result<BoundingBox> {
    let first = mesh
        .vertices
        .first()
        .ok_or_else(|| Error::geometry("Cannot compute bounding box of empty mesh"))?;

    let mut bbox = BoundingBox {
        min_x: first.x,
        min_y: first.y,
        min_z: first.z,
        max_x: first.x,
        max_y: first.y,
        max_z: first.z,
    };

    for (index, v) in mesh.vertices.iter().enumerate() {
        if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
            return Err(Error::geometry(format!(
                "Vertex {} has non-finite coordinates ({}, {}, {})",
                index, v.x, v.y, v.z
            )));
        }
        bbox.min_x = bbox.min_x.min(v.x);
        bbox.min_y = bbox.min_y.min(v.y);
        bbox.min_z = bbox.min_z.min(v.z);
        bbox.max_x = bbox.max_x.max(v.x);
        bbox.max_y = bbox.max_y.max(v.y);
        bbox.max_z = bbox.max_z.max(v.z);
    }

    Ok(bbox)
}

/// 3x3 rotation matrix for rotations in degrees about X, Y and Z
///
/// The combined rotation applies Z first, then Y, then X.
pub fn rotation_matrix(rot_x: f64, rot_y: f64, rot_z: f64) -> [[f64; 3]; 3] {
    let (sx, cx) = rot_x.to_radians().sin_cos();
    let (sy, cy) = rot_y.to_radians().sin_cos();
    let (sz, cz) = rot_z.to_radians().sin_cos();

    [
        [cy * cz, cy * sz, -sy],
        [sx * sy * cz - cx * sz, sx * sy * sz + cx * cz, sx * cy],
        [cx * sy * cz + sx * sz, cx * sy * sz - sx * cz, cx * cy],
    ]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    // collapse -0.0 so it never prints with a sign
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// A 3MF affine transform: 3x3 rotation block followed by a translation
///
/// Stored as the 12 numbers of the serialized form,
/// `m11 m12 m13 m21 m22 m23 m31 m32 m33 tx ty tz`. Constructors round the
/// rotation terms to 8 decimals and the translation to 2 decimals, so the
/// value survives a trip through its string form unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform([f64; 12]);

impl Transform {
    /// Pure translation
    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self([
            1.0,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
            0.0,
            0.0,
            1.0,
            round_to(tx, 2),
            round_to(ty, 2),
            round_to(tz, 2),
        ])
    }

    /// Rotation in degrees (Z, then Y, then X) followed by a translation
    pub fn rotation(rot_x: f64, rot_y: f64, rot_z: f64, tx: f64, ty: f64, tz: f64) -> Self {
        let m = rotation_matrix(rot_x, rot_y, rot_z);
        let mut values = [0.0; 12];
        for (row, terms) in m.iter().enumerate() {
            for (col, term) in terms.iter().enumerate() {
                values[row * 3 + col] = round_to(*term, 8);
            }
        }
        values[9] = round_to(tx, 2);
        values[10] = round_to(ty, 2);
        values[11] = round_to(tz, 2);
        Self(values)
    }

    /// Build from 12 raw values without rounding
    pub fn from_array(values: [f64; 12]) -> Self {
        Self(values)
    }

    /// The 12 values in serialized order
    pub fn as_array(&self) -> &[f64; 12] {
        &self.0
    }

    /// The 3x3 rotation block
    pub fn rotation_block(&self) -> [[f64; 3]; 3] {
        let m = &self.0;
        [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]]
    }

    /// The translation `(tx, ty, tz)`
    pub fn offset(&self) -> [f64; 3] {
        [self.0[9], self.0[10], self.0[11]]
    }

    /// True when the rotation block is the identity
    pub fn is_translation_only(&self) -> bool {
        self.0[..9] == [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    }

    /// Transform a point
    pub fn apply(&self, v: &Vertex) -> Vertex {
        let m = &self.0;
        Vertex::new(
            v.x * m[0] + v.y * m[3] + v.z * m[6] + m[9],
            v.x * m[1] + v.y * m[4] + v.z * m[7] + m[10],
            v.x * m[2] + v.y * m[5] + v.z * m[8] + m[11],
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::translation(0.0, 0.0, 0.0)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_translation_only() {
            f.write_str("1 0 0 0 1 0 0 0 1")?;
        } else {
            for (i, term) in self.0[..9].iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:.8}", round_to(*term, 8))?;
            }
        }
        for term in &self.0[9..] {
            write!(f, " {:.2}", round_to(*term, 2))?;
        }
        Ok(())
    }
}

impl FromStr for Transform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut values = [0.0; 12];
        let mut count = 0;
        for token in s.split_whitespace() {
            if count == 12 {
                return Err(Error::parse_error_with_context(
                    "transform",
                    s,
                    "exactly 12 numbers",
                ));
            }
            values[count] = token.parse::<f64>().map_err(|_| {
                Error::parse_error_with_context("transform value", token, "floating-point number")
            })?;
            if !values[count].is_finite() {
                return Err(Error::parse_error_with_context(
                    "transform value",
                    token,
                    "finite number",
                ));
            }
            count += 1;
        }
        if count != 12 {
            return Err(Error::parse_error_with_context(
                "transform",
                s,
                "exactly 12 numbers",
            ));
        }
        Ok(Self(values))
    }
}

/// Bake a rotation into the mesh vertices
///
/// Returns the minimum Z after rotation. Fails on a mesh without vertices
/// or with non-finite coordinates.
pub fn rotate_vertices(mesh: &mut Mesh, rot_x: f64, rot_y: f64, rot_z: f64) -> Result<f64> {
    if mesh.vertices.is_empty() {
        return Err(Error::geometry("Cannot rotate mesh without vertices"));
    }

    let m = rotation_matrix(rot_x, rot_y, rot_z);
    let identity = rot_x == 0.0 && rot_y == 0.0 && rot_z == 0.0;
    let mut min_z = f64::INFINITY;

    for v in &mut mesh.vertices {
        if !identity {
            let (x, y, z) = (v.x, v.y, v.z);
            v.x = x * m[0][0] + y * m[1][0] + z * m[2][0];
            v.y = x * m[0][1] + y * m[1][1] + z * m[2][1];
            v.z = x * m[0][2] + y * m[1][2] + z * m[2][2];
        }
        if !v.z.is_finite() {
            return Err(Error::geometry(format!(
                "Rotated vertex has non-finite Z coordinate: {}",
                v.z
            )));
        }
        min_z = min_z.min(v.z);
    }

    Ok(min_z)
}

/// Translate every vertex of the mesh along Z
pub fn apply_z_offset(mesh: &mut Mesh, dz: f64) {
    for v in &mut mesh.vertices {
        v.z += dz;
    }
}
