//! Domain types for grounded document extraction.
//!
//! * `element` - Typed page elements with stable ids and geometry metrics
//! * `structure` - Linked document structure with reading order and groups

pub mod element;
pub mod structure;

pub use element::{BBoxMetrics, Element, ElementId, ElementType};
pub use structure::{DocumentMetadata, DocumentStructure, ElementGroup, PageSummary};
