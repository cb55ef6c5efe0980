//! Bounding box math for grounded OCR output.
//!
//! Grounding references carry coordinates normalized to the `[0, 999]` range.
//! This module converts them to pixel space, validates the result against the
//! page dimensions, and provides the geometric queries (metrics, overlap,
//! clipping, padding) the rest of the pipeline builds on.

use serde::{Deserialize, Serialize};

/// Virtual coordinate range used by grounded OCR models.
pub const NORM_RANGE: i32 = 999;

/// A bounding box in the model's normalized `[0, 999]` coordinate space.
///
/// Coordinates are carried as parsed and may fall outside the nominal range;
/// [`denormalize_bbox`] clamps during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormBBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl NormBBox {
    /// Creates a normalized bounding box from raw model coordinates.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// An axis-aligned bounding box in pixel coordinates.
///
/// Serializes as the 4-element array `[x0, y0, x1, y1]` used by the element
/// metadata contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 4]", from = "[u32; 4]")]
pub struct BoundingBox {
    /// Left edge.
    pub x0: u32,
    /// Top edge.
    pub y0: u32,
    /// Right edge (exclusive).
    pub x1: u32,
    /// Bottom edge (exclusive).
    pub y1: u32,
}

impl From<BoundingBox> for [u32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
    }
}

impl From<[u32; 4]> for BoundingBox {
    fn from(coords: [u32; 4]) -> Self {
        Self {
            x0: coords[0],
            y0: coords[1],
            x1: coords[2],
            y1: coords[3],
        }
    }
}

impl BoundingBox {
    /// Creates a pixel bounding box.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Width in pixels. Zero for inverted or degenerate boxes.
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    /// Height in pixels. Zero for inverted or degenerate boxes.
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Width over height, or `0.0` when the height is zero.
    pub fn aspect_ratio(&self) -> f64 {
        let height = self.height();
        if height == 0 {
            0.0
        } else {
            self.width() as f64 / height as f64
        }
    }
}

/// A reason a bounding box failed validation against the page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryIssue {
    /// The box has zero width or zero height.
    #[error("degenerate box (zero width or height)")]
    Degenerate,
    /// The box extends past the page boundary.
    #[error("box exceeds page bounds")]
    OutOfBounds,
    /// The box's coordinates are inverted (x1 < x0 or y1 < y0).
    #[error("inverted coordinates")]
    Inverted,
}

/// Converts a single normalized coordinate to pixels along a dimension.
///
/// Truncating integer conversion: `px = coord * dim / 999`, clamped to
/// `[0, dim]`.
fn denormalize_coord(coord: i32, dim: u32) -> u32 {
    let px = coord as i64 * dim as i64 / NORM_RANGE as i64;
    px.clamp(0, dim as i64) as u32
}

/// Converts a normalized `[0, 999]` box to pixel coordinates on a page.
///
/// The conversion truncates (it does not round), then clamps each coordinate
/// into `[0, dim]` and swaps inverted coordinate pairs. The result is always
/// inside the page with non-inverted ordering; it may still be degenerate,
/// which [`validate_bbox`] reports separately.
///
/// # Arguments
///
/// * `norm` - The normalized box as parsed from a grounding reference.
/// * `width` - Page width in pixels.
/// * `height` - Page height in pixels.
pub fn denormalize_bbox(norm: NormBBox, width: u32, height: u32) -> BoundingBox {
    let mut x0 = denormalize_coord(norm.x0, width);
    let mut x1 = denormalize_coord(norm.x1, width);
    let mut y0 = denormalize_coord(norm.y0, height);
    let mut y1 = denormalize_coord(norm.y1, height);

    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
    }
    if y0 > y1 {
        std::mem::swap(&mut y0, &mut y1);
    }

    BoundingBox { x0, y0, x1, y1 }
}

/// Validates a pixel bounding box against the page dimensions.
///
/// Requires `x0 < x1 <= width` and `y0 < y1 <= height`. Degenerate boxes are
/// invalid even when inside the page.
pub fn validate_bbox(bbox: &BoundingBox, width: u32, height: u32) -> Result<(), GeometryIssue> {
    if bbox.x1 < bbox.x0 || bbox.y1 < bbox.y0 {
        return Err(GeometryIssue::Inverted);
    }
    if bbox.x1 > width || bbox.y1 > height {
        return Err(GeometryIssue::OutOfBounds);
    }
    if bbox.x0 == bbox.x1 || bbox.y0 == bbox.y1 {
        return Err(GeometryIssue::Degenerate);
    }
    Ok(())
}

/// Clamps a pixel bounding box into the page.
pub fn clip_bbox(bbox: &BoundingBox, width: u32, height: u32) -> BoundingBox {
    BoundingBox {
        x0: bbox.x0.min(width),
        y0: bbox.y0.min(height),
        x1: bbox.x1.min(width),
        y1: bbox.y1.min(height),
    }
}

/// Expands a bounding box outward by `padding` pixels on every side,
/// clamped to the page.
pub fn pad_bbox(bbox: &BoundingBox, padding: u32, width: u32, height: u32) -> BoundingBox {
    BoundingBox {
        x0: bbox.x0.saturating_sub(padding),
        y0: bbox.y0.saturating_sub(padding),
        x1: bbox.x1.saturating_add(padding).min(width),
        y1: bbox.y1.saturating_add(padding).min(height),
    }
}

/// Computes the intersection-over-union of two pixel bounding boxes.
///
/// Areas are computed as integers, so `iou(a, a)` is exactly `1.0` for any
/// non-degenerate box. Disjoint boxes give `0.0`. The operation is symmetric.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let ix0 = a.x0.max(b.x0) as i64;
    let iy0 = a.y0.max(b.y0) as i64;
    let ix1 = a.x1.min(b.x1) as i64;
    let iy1 = a.y1.min(b.y1) as i64;

    let iw = (ix1 - ix0).max(0);
    let ih = (iy1 - iy0).max(0);
    let intersection = iw * ih;
    if intersection == 0 {
        return 0.0;
    }

    let union = a.area() as i64 + b.area() as i64 - intersection;
    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}
