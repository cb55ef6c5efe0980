//! Extraction and linking pipeline.
//!
//! * `extractor` - Materializes typed elements from raw model output
//! * `linker` - Builds reading order and element groups

pub mod extractor;
pub mod linker;

pub use extractor::{ExtractOptions, ExtractionDiagnostics, crop_element, extract_elements};
pub use linker::{LinkerConfig, PageGeometry, link_document};
