//! 2D rectangle packing for laying out objects on the build plate
//!
//! The packer works purely on axis-aligned footprints. It never rejects input
//! and always returns exactly one [`Placement`] per [`Rect`], in input order.
//! Placements are separated by at least the configured margin.
//!
//! Three algorithms are available:
//! - [`PackingAlgorithm::Shelf`] (`"default"`): rows left to right, larger
//!   footprints first, new row once the row width limit is exceeded.
//! - [`PackingAlgorithm::Guillotine`] (`"compact"`): free-space splitting in a
//!   roughly square bin, tallest footprints first.
//! - [`PackingAlgorithm::Grid`] (`"grid"`): fixed columns in input order.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Row width limit used by the shelf packer when none is configured (mm)
pub const DEFAULT_MAX_ROW_WIDTH: f64 = 256.0;

/// Smallest bin width the guillotine packer starts with (mm)
const MIN_BIN_WIDTH: f64 = 100.0;

/// Slack applied to the total footprint area when sizing the guillotine bin
const BIN_AREA_FACTOR: f64 = 1.2;

/// Packing algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PackingAlgorithm {
    /// Shelf packing
    #[default]
    #[serde(rename = "default", alias = "shelf")]
    Shelf,
    /// Guillotine free-space packing
    #[serde(rename = "compact", alias = "guillotine")]
    Guillotine,
    /// Fixed grid in input order
    #[serde(rename = "grid")]
    Grid,
}

impl PackingAlgorithm {
    /// Configuration name of the algorithm
    pub fn name(&self) -> &'static str {
        match self {
            PackingAlgorithm::Shelf => "default",
            PackingAlgorithm::Guillotine => "compact",
            PackingAlgorithm::Grid => "grid",
        }
    }
}

impl fmt::Display for PackingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackingAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" | "shelf" => Ok(PackingAlgorithm::Shelf),
            "compact" | "guillotine" => Ok(PackingAlgorithm::Guillotine),
            "grid" => Ok(PackingAlgorithm::Grid),
            other => Err(Error::invalid_config(
                "algorithm",
                &format!("unknown packing algorithm '{}'", other),
            )),
        }
    }
}

/// A footprint to be placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Caller-defined identifier, passed through unchanged
    pub id: usize,
    /// Extent along X
    pub width: f64,
    /// Extent along Y
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(id: usize, width: f64, height: f64) -> Self {
        Self { id, width, height }
    }

    fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Lower-left corner assigned to a [`Rect`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    /// Identifier of the placed rectangle
    pub id: usize,
    /// X of the lower-left corner
    pub x: f64,
    /// Y of the lower-left corner
    pub y: f64,
    /// Extent along X
    pub width: f64,
    /// Extent along Y
    pub height: f64,
}

impl Placement {
    /// True when the interiors of the two placements intersect
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Rectangle packer
///
/// # Example
///
/// ```
/// use threemf_merge::packing::{Packer, PackingAlgorithm, Rect};
///
/// let packer = Packer::new(10.0).with_algorithm(PackingAlgorithm::Shelf);
/// let placements = packer.pack(&[Rect::new(0, 40.0, 40.0), Rect::new(1, 60.0, 30.0)]);
/// assert_eq!(placements.len(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packer {
    margin: f64,
    max_row_width: f64,
    algorithm: PackingAlgorithm,
}

impl Packer {
    /// Create a shelf packer with the given spacing between footprints
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            max_row_width: DEFAULT_MAX_ROW_WIDTH,
            algorithm: PackingAlgorithm::Shelf,
        }
    }

    /// Row width limit for the shelf packer
    pub fn with_max_row_width(mut self, width: f64) -> Self {
        self.max_row_width = width;
        self
    }

    /// Select the packing algorithm
    pub fn with_algorithm(mut self, algorithm: PackingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Spacing between footprints
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Pack the rectangles; the result is in input order
    pub fn pack(&self, rects: &[Rect]) -> Vec<Placement> {
        if rects.is_empty() {
            return Vec::new();
        }
        debug!(
            "Packing {} footprints with {} algorithm, margin {}",
            rects.len(),
            self.algorithm,
            self.margin
        );
        match self.algorithm {
            PackingAlgorithm::Shelf => self.pack_shelf(rects),
            PackingAlgorithm::Guillotine => self.pack_guillotine(rects),
            PackingAlgorithm::Grid => self.pack_grid(rects),
        }
    }

    fn pack_shelf(&self, rects: &[Rect]) -> Vec<Placement> {
        let mut order: Vec<usize> = (0..rects.len()).collect();
        order.sort_by(|&a, &b| {
            let (ra, rb) = (&rects[a], &rects[b]);
            rb.area()
                .total_cmp(&ra.area())
                .then_with(|| rb.height.total_cmp(&ra.height))
        });

        let mut placements = vec![Placement::default(); rects.len()];
        let mut x = 0.0;
        let mut y = 0.0;
        let mut shelf_height: f64 = 0.0;

        for index in order {
            let rect = &rects[index];
            if x > 0.0 && x + rect.width > self.max_row_width {
                x = 0.0;
                y += shelf_height + self.margin;
                shelf_height = 0.0;
            }
            placements[index] = place(rect, x, y);
            trace!("shelf: rect {} at ({:.2}, {:.2})", rect.id, x, y);
            x += rect.width + self.margin;
            shelf_height = shelf_height.max(rect.height);
        }

        placements
    }

    fn pack_guillotine(&self, rects: &[Rect]) -> Vec<Placement> {
        let margin = self.margin;
        let mut order: Vec<usize> = (0..rects.len()).collect();
        order.sort_by(|&a, &b| {
            let (ra, rb) = (&rects[a], &rects[b]);
            rb.height
                .total_cmp(&ra.height)
                .then_with(|| rb.width.total_cmp(&ra.width))
        });

        let total_area: f64 = rects.iter().map(Rect::area).sum();
        let widest = rects.iter().map(|r| r.width).fold(0.0, f64::max);
        let bin_width = (total_area * BIN_AREA_FACTOR)
            .sqrt()
            .max(widest + margin)
            .max(MIN_BIN_WIDTH);
        debug!("guillotine: bin width {:.2}", bin_width);

        let mut free = vec![FreeSpace {
            x: 0.0,
            y: 0.0,
            width: bin_width,
            height: f64::INFINITY,
        }];
        let mut placements = vec![Placement::default(); rects.len()];
        let mut occupied_max_y: f64 = 0.0;

        for index in order {
            let rect = &rects[index];
            let needed_w = rect.width + margin;
            let needed_h = rect.height + margin;

            let slot = free
                .iter()
                .position(|f| needed_w <= f.width && needed_h <= f.height);

            let (x, y) = match slot {
                Some(pos) => {
                    let f = free.remove(pos);
                    free.push(FreeSpace {
                        x: f.x + needed_w,
                        y: f.y,
                        width: f.width - needed_w,
                        height: needed_h,
                    });
                    free.push(FreeSpace {
                        x: f.x,
                        y: f.y + needed_h,
                        width: f.width,
                        height: f.height - needed_h,
                    });
                    (f.x, f.y)
                }
                // The full-width strip below everything placed always fits
                // finite footprints, so this only runs for degenerate sizes.
                None => {
                    trace!("guillotine: rect {} placed on a new row", rect.id);
                    place_below(&mut free, bin_width, occupied_max_y, needed_w, needed_h)
                }
            };

            free.retain(FreeSpace::is_usable);
            free.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.x.total_cmp(&b.x)));

            placements[index] = place(rect, x, y);
            trace!("guillotine: rect {} at ({:.2}, {:.2})", rect.id, x, y);
            if (y + needed_h).is_finite() {
                occupied_max_y = occupied_max_y.max(y + needed_h);
            }
        }

        placements
    }

    fn pack_grid(&self, rects: &[Rect]) -> Vec<Placement> {
        let columns = (rects.len() as f64).sqrt().ceil().max(1.0) as usize;
        let rows = rects.len().div_ceil(columns);

        let mut column_widths = vec![0.0_f64; columns];
        let mut row_heights = vec![0.0_f64; rows];
        for (i, rect) in rects.iter().enumerate() {
            column_widths[i % columns] = column_widths[i % columns].max(rect.width);
            row_heights[i / columns] = row_heights[i / columns].max(rect.height);
        }

        let column_x: Vec<f64> = column_widths
            .iter()
            .scan(0.0, |acc, w| {
                let x = *acc;
                *acc += w + self.margin;
                Some(x)
            })
            .collect();
        let row_y: Vec<f64> = row_heights
            .iter()
            .scan(0.0, |acc, h| {
                let y = *acc;
                *acc += h + self.margin;
                Some(y)
            })
            .collect();

        rects
            .iter()
            .enumerate()
            .map(|(i, rect)| place(rect, column_x[i % columns], row_y[i / columns]))
            .collect()
    }
}

impl Default for Packer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MARGIN)
    }
}

fn place(rect: &Rect, x: f64, y: f64) -> Placement {
    Placement {
        id: rect.id,
        x,
        y,
        width: rect.width,
        height: rect.height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FreeSpace {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FreeSpace {
    fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    fn intersects(&self, other: &FreeSpace) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Place a footprint at `(0, occupied_max_y)` when no free space fits it
///
/// Free spaces overlapping the new footprint are dropped, and the row to its
/// right plus the unbounded strip below it become free.
fn place_below(
    free: &mut Vec<FreeSpace>,
    bin_width: f64,
    occupied_max_y: f64,
    needed_w: f64,
    needed_h: f64,
) -> (f64, f64) {
    let (x, y) = (0.0, occupied_max_y);
    let footprint = FreeSpace {
        x,
        y,
        width: needed_w,
        height: needed_h,
    };
    free.retain(|f| !f.intersects(&footprint));
    free.push(FreeSpace {
        x: needed_w,
        y,
        width: bin_width - needed_w,
        height: needed_h,
    });
    free.push(FreeSpace {
        x: 0.0,
        y: y + needed_h,
        width: bin_width.max(needed_w),
        height: f64::INFINITY,
    });
    (x, y)
}
