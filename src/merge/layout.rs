//! Ground normalization, footprints and plate layout

use log::{debug, warn};

use super::{MergeContext, ObjectGroup, Plate};
use crate::geometry::{BoundingBox, apply_z_offset, bounding_box};
use crate::packing::{Packer, Rect};

/// Footprint used when a single part's bounding box cannot be computed (mm)
pub(crate) const SINGLE_PART_FALLBACK: f64 = 50.0;

/// Footprint used when no member of a multi-part group has a bounding box (mm)
pub(crate) const GROUP_FALLBACK: f64 = 100.0;

/// The XY extent a group occupies on the plate
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Footprint {
    pub width: f64,
    pub height: f64,
    /// Shift that moves the footprint's lower-left corner to the origin
    pub offset: [f64; 2],
}

impl Footprint {
    fn fallback(size: f64) -> Self {
        Self {
            width: size,
            height: size,
            offset: [0.0, 0.0],
        }
    }

    fn from_box(bbox: &BoundingBox) -> Self {
        Self {
            width: bbox.width(),
            height: bbox.height(),
            offset: [-bbox.min_x, -bbox.min_y],
        }
    }
}

/// A group with its final plate position
#[derive(Debug, Clone)]
pub(crate) struct PlacedGroup {
    pub group: ObjectGroup,
    /// Packed position plus plate offset plus corner alignment
    pub origin: [f64; 2],
}

/// A plate whose groups have been placed
#[derive(Debug, Clone)]
pub(crate) struct PlacedPlate {
    pub name: String,
    pub groups: Vec<PlacedGroup>,
}

/// Drop a group onto the ground
///
/// The lowest point of the group is `min(part min z + part z position)`.
/// When normalization is enabled and that point is not at zero, every member
/// mesh is shifted by its negation.
pub(crate) fn normalize_group(group: &mut ObjectGroup) {
    let group_min = group
        .parts
        .iter()
        .map(|p| p.min_z + p.position.z)
        .fold(f64::INFINITY, f64::min);

    if !group.normalize || !group_min.is_finite() || group_min == 0.0 {
        return;
    }

    debug!("Group '{}': shifting by {:.4} in Z", group.name, -group_min);
    for part in &mut group.parts {
        apply_z_offset(&mut part.mesh, -group_min);
        part.min_z -= group_min;
    }
}

/// Compute the footprint of a group
///
/// A single part uses its own bounding box. A multi-part group uses the
/// union of its members' boxes shifted by their XY positions; members whose
/// box cannot be computed are skipped.
pub(crate) fn footprint(group: &ObjectGroup) -> Footprint {
    if let [part] = group.parts.as_slice() {
        return match bounding_box(&part.mesh) {
            Ok(bbox) => Footprint::from_box(&bbox),
            Err(e) => {
                warn!(
                    "Group '{}': {}; using a {}x{} mm footprint",
                    group.name, e, SINGLE_PART_FALLBACK, SINGLE_PART_FALLBACK
                );
                Footprint::fallback(SINGLE_PART_FALLBACK)
            }
        };
    }

    let mut union: Option<BoundingBox> = None;
    for part in &group.parts {
        match bounding_box(&part.mesh) {
            Ok(bbox) => {
                let shifted = bbox.translated(part.position.x, part.position.y);
                union = Some(match union {
                    Some(acc) => acc.union(&shifted),
                    None => shifted,
                });
            }
            Err(e) => warn!(
                "Group '{}': skipping part '{}' in footprint: {}",
                group.name, part.name, e
            ),
        }
    }

    match union {
        Some(bbox) => Footprint::from_box(&bbox),
        None => {
            warn!(
                "Group '{}': no member has a bounding box; using a {}x{} mm footprint",
                group.name, GROUP_FALLBACK, GROUP_FALLBACK
            );
            Footprint::fallback(GROUP_FALLBACK)
        }
    }
}

/// Normalize, measure and pack every plate
///
/// Plates are laid side by side along X, `plate_width` apart.
pub(crate) fn layout(context: &MergeContext, plates: Vec<Plate>) -> Vec<PlacedPlate> {
    let packer = Packer::new(context.margin)
        .with_max_row_width(context.plate_width)
        .with_algorithm(context.algorithm);

    plates
        .into_iter()
        .enumerate()
        .map(|(plate_index, mut plate)| {
            for group in &mut plate.groups {
                normalize_group(group);
            }

            let footprints: Vec<Footprint> = plate.groups.iter().map(footprint).collect();
            let rects: Vec<Rect> = footprints
                .iter()
                .enumerate()
                .map(|(i, f)| Rect::new(i, f.width, f.height))
                .collect();
            let placements = packer.pack(&rects);
            let plate_offset = plate_index as f64 * context.plate_width;

            let groups = plate
                .groups
                .into_iter()
                .zip(footprints.iter().zip(&placements))
                .map(|(group, (footprint, placement))| {
                    let origin = [
                        plate_offset + placement.x + footprint.offset[0],
                        placement.y + footprint.offset[1],
                    ];
                    debug!(
                        "Group '{}' on plate {}: {:.2}x{:.2} at ({:.2}, {:.2})",
                        group.name,
                        plate_index + 1,
                        footprint.width,
                        footprint.height,
                        placement.x,
                        placement.y
                    );
                    PlacedGroup { group, origin }
                })
                .collect();

            PlacedPlate {
                name: plate.name,
                groups,
            }
        })
        .collect()
}
