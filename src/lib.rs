//! # doc-grounding
//!
//! A Rust library for turning raw grounded OCR model output into structured
//! document data. The input is the text a vision-language OCR model emits for
//! a document page: prose interleaved with inline grounding references that
//! tie a semantic element type to a normalized bounding box.
//!
//! ## Pipeline
//!
//! - **Parse**: scan grounding references out of the raw model output
//! - **Denormalize**: convert [0, 999] coordinates to pixel space
//! - **Extract**: materialize typed [`Element`](domain::Element) values with
//!   stable ids and geometry metrics
//! - **Link**: build a [`DocumentStructure`](domain::DocumentStructure) with
//!   reading order and element groups
//! - **Persist**: crop each element out of the page image and write crop +
//!   JSON metadata
//! - **Visualize**: render per-type and combined overlay images
//!
//! Malformed model output is diagnosed and skipped, never fatal; counts of
//! dropped references come back as diagnostics alongside the results.
//!
//! ## Modules
//!
//! * [`core`] - Error types shared across the pipeline
//! * [`domain`] - Element and document structure types
//! * [`processors`] - Grounding reference scanner and bounding box math
//! * [`pipeline`] - Element extraction and structure linking
//! * [`utils`] - Cropping, persistence, and overlay rendering
//!
//! ## Quick Start
//!
//! ```rust
//! use doc_grounding::prelude::*;
//!
//! # fn main() -> Result<(), ExtractError> {
//! let raw = "<|ref|>title<|/ref|><|det|>[[125, 50, 875, 100]]<|/det|>Introduction";
//! let opts = ExtractOptions::default();
//! let (elements, diagnostics) = extract_elements(raw, 1, 800, 1000, &opts);
//! assert_eq!(elements.len(), 1);
//! assert_eq!(diagnostics.malformed_references, 0);
//!
//! let pages = [PageGeometry::new(1, 800, 1000)];
//! let structure = link_document(elements, &pages, &LinkerConfig::default())?;
//! assert_eq!(structure.elements.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::core::errors::{ExtractError, ExtractResult};
    pub use crate::domain::{
        BBoxMetrics, DocumentStructure, Element, ElementGroup, ElementId, ElementType,
    };
    pub use crate::pipeline::{
        ExtractOptions, ExtractionDiagnostics, LinkerConfig, PageGeometry, extract_elements,
        link_document,
    };
    pub use crate::processors::{
        BoundingBox, NormBBox, ParseDiagnostics, RawGroundingReference, denormalize_bbox,
        parse_references,
    };
    pub use crate::utils::{
        BatchSaveReport, OverlayConfig, render_all_overlays, save_all_elements, save_element,
    };
}
