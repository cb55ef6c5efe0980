//! Processing primitives for grounded OCR output.
//!
//! # Modules
//!
//! * `bbox` - Bounding box denormalization, validation, metrics, and overlap
//! * `grounding` - Scanner for inline grounding references in raw model text

pub mod bbox;
pub mod grounding;

pub use bbox::{
    BoundingBox, GeometryIssue, NormBBox, clip_bbox, denormalize_bbox, iou, pad_bbox,
    validate_bbox,
};
pub use grounding::{ParseDiagnostics, RawGroundingReference, parse_references};
