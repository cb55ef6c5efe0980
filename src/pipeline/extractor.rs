//! Element extraction from raw grounded OCR output.
//!
//! Ties the grounding scanner and the bounding box processor together: each
//! parsed reference is denormalized against the page size, validated, typed,
//! and given a stable id. Everything the page loses on the way is tallied in
//! [`ExtractionDiagnostics`] rather than raised as an error.

use image::RgbImage;
use tracing::{debug, warn};

use crate::domain::{Element, ElementId, ElementType};
use crate::processors::bbox::{self, GeometryIssue};
use crate::processors::grounding;

/// Options controlling element extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Minimum element width in pixels after denormalization.
    pub min_width: u32,
    /// Minimum element height in pixels after denormalization.
    pub min_height: u32,
    /// When true, boxes that fail validation are dropped. When false,
    /// out-of-bounds boxes are clipped to the page instead; degenerate
    /// results still drop.
    pub strict: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_width: 10,
            min_height: 10,
            strict: true,
        }
    }
}

/// Counters for model output dropped or flagged during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionDiagnostics {
    /// Grounding tags dropped by the scanner.
    pub malformed_references: usize,
    /// References dropped for invalid or undersized geometry.
    pub invalid_geometry: usize,
    /// Elements kept with an unrecognized type label.
    pub unknown_types: usize,
}

/// Extracts typed elements from the raw model output for one page.
///
/// Element ids are assigned from an explicit counter local to this call,
/// starting at index 0 in extraction order; ids stay contiguous because
/// dropped references do not consume an index.
///
/// # Arguments
///
/// * `raw` - Raw model output text for the page.
/// * `page` - Page number, counting from 1, used in element ids.
/// * `width` - Page width in pixels.
/// * `height` - Page height in pixels.
/// * `opts` - Extraction options.
pub fn extract_elements(
    raw: &str,
    page: u32,
    width: u32,
    height: u32,
    opts: &ExtractOptions,
) -> (Vec<Element>, ExtractionDiagnostics) {
    let (references, parse_diag) = grounding::parse_references(raw);
    let mut diagnostics = ExtractionDiagnostics {
        malformed_references: parse_diag.malformed_references,
        ..Default::default()
    };

    let mut elements = Vec::with_capacity(references.len());
    let mut index = 0u32;

    for reference in references {
        let bbox = bbox::denormalize_bbox(reference.bbox, width, height);

        let bbox = match bbox::validate_bbox(&bbox, width, height) {
            Ok(()) => bbox,
            Err(issue) if !opts.strict && issue == GeometryIssue::OutOfBounds => {
                let clipped = bbox::clip_bbox(&bbox, width, height);
                if bbox::validate_bbox(&clipped, width, height).is_err() {
                    warn!(label = %reference.type_label, "dropping clipped degenerate box");
                    diagnostics.invalid_geometry += 1;
                    continue;
                }
                clipped
            }
            Err(issue) => {
                warn!(label = %reference.type_label, %issue, "dropping element with invalid geometry");
                diagnostics.invalid_geometry += 1;
                continue;
            }
        };

        if bbox.width() < opts.min_width || bbox.height() < opts.min_height {
            warn!(
                label = %reference.type_label,
                width = bbox.width(),
                height = bbox.height(),
                "dropping element below minimum size"
            );
            diagnostics.invalid_geometry += 1;
            continue;
        }

        let element_type = ElementType::from_label(&reference.type_label);
        if element_type == ElementType::Unknown {
            debug!(label = %reference.type_label, "keeping element with unknown type label");
            diagnostics.unknown_types += 1;
        }

        elements.push(
            Element::new(ElementId::new(page, index), element_type, bbox, page)
                .with_label(reference.type_label)
                .with_text(reference.span_text),
        );
        index += 1;
    }

    debug!(
        page,
        extracted = elements.len(),
        malformed = diagnostics.malformed_references,
        invalid_geometry = diagnostics.invalid_geometry,
        unknown_types = diagnostics.unknown_types,
        "extracted elements"
    );

    (elements, diagnostics)
}

/// Crops an element's region out of the page image.
///
/// The crop window is the element's bounding box expanded by `padding`
/// pixels, clamped to the page. The source image is never mutated.
pub fn crop_element(image: &RgbImage, element: &Element, padding: u32) -> RgbImage {
    let bbox = bbox::pad_bbox(&element.bbox, padding, image.width(), image.height());
    image::imageops::crop_imm(image, bbox.x0, bbox.y0, bbox.width(), bbox.height()).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::BoundingBox;

    #[test]
    fn test_extract_end_to_end_vector() {
        let raw = "<|ref|>title<|/ref|><|det|>[[100, 50, 700, 100]]<|/det|>Heading\
                   <|ref|>text<|/ref|><|det|>[[100, 150, 700, 400]]<|/det|>Body";
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &ExtractOptions::default());

        assert_eq!(elements.len(), 2);
        assert_eq!(diag, ExtractionDiagnostics::default());

        assert_eq!(elements[0].element_type, ElementType::Title);
        assert_eq!(elements[0].bbox, BoundingBox::new(80, 50, 560, 100));
        assert_eq!(elements[0].id.to_string(), "page_0001_elem_0000");
        assert_eq!(elements[0].text.as_deref(), Some("Heading"));

        assert_eq!(elements[1].element_type, ElementType::Paragraph);
        assert_eq!(elements[1].bbox, BoundingBox::new(80, 150, 560, 400));
        assert_eq!(elements[1].id.to_string(), "page_0001_elem_0001");
    }

    #[test]
    fn test_malformed_reference_is_tallied() {
        let raw = "<|ref|>title<|/ref|><|det|>[[100, 50, 700, 100]]<|/det|>Good\
                   <|ref|>text<|/ref|>broken";
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &ExtractOptions::default());
        assert_eq!(elements.len(), 1);
        assert_eq!(diag.malformed_references, 1);
    }

    #[test]
    fn test_degenerate_geometry_is_dropped() {
        let raw = "<|ref|>text<|/ref|><|det|>[[100, 50, 100, 400]]<|/det|>zero width";
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &ExtractOptions::default());
        assert!(elements.is_empty());
        assert_eq!(diag.invalid_geometry, 1);
    }

    #[test]
    fn test_min_size_filter() {
        // 5 / 999 * 800 = 4 px wide, below the default 10 px minimum
        let raw = "<|ref|>text<|/ref|><|det|>[[0, 0, 5, 500]]<|/det|>sliver";
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &ExtractOptions::default());
        assert!(elements.is_empty());
        assert_eq!(diag.invalid_geometry, 1);
    }

    #[test]
    fn test_non_strict_keeps_box_clipped_to_page() {
        // 1100 > 999 lands past the right edge and is clipped to the page
        let raw = "<|ref|>text<|/ref|><|det|>[[100, 50, 1100, 400]]<|/det|>wide";
        let opts = ExtractOptions {
            strict: false,
            ..ExtractOptions::default()
        };
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &opts);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].bbox, BoundingBox::new(80, 50, 800, 400));
        assert_eq!(diag.invalid_geometry, 0);
    }

    #[test]
    fn test_non_strict_drops_box_that_collapses_when_clipped() {
        // both x coordinates land past the right edge; clipping leaves a
        // zero-width box, which still drops
        let raw = "<|ref|>text<|/ref|><|det|>[[1000, 50, 1100, 400]]<|/det|>gone";
        let opts = ExtractOptions {
            strict: false,
            ..ExtractOptions::default()
        };
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &opts);
        assert!(elements.is_empty());
        assert_eq!(diag.invalid_geometry, 1);
    }

    #[test]
    fn test_unknown_label_kept_and_tallied() {
        let raw = "<|ref|>sidebar<|/ref|><|det|>[[100, 50, 700, 400]]<|/det|>aside";
        let (elements, diag) = extract_elements(raw, 1, 800, 1000, &ExtractOptions::default());
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].element_type, ElementType::Unknown);
        assert_eq!(elements[0].label, "sidebar");
        assert_eq!(diag.unknown_types, 1);
    }

    #[test]
    fn test_ids_stay_contiguous_past_drops() {
        let raw = "<|ref|>text<|/ref|><|det|>[[100, 50, 700, 100]]<|/det|>first\
                   <|ref|>text<|/ref|><|det|>[[0, 0, 0, 0]]<|/det|>dropped\
                   <|ref|>text<|/ref|><|det|>[[100, 150, 700, 400]]<|/det|>second";
        let (elements, diag) = extract_elements(raw, 2, 800, 1000, &ExtractOptions::default());
        assert_eq!(elements.len(), 2);
        assert_eq!(diag.invalid_geometry, 1);
        assert_eq!(elements[0].id, ElementId::new(2, 0));
        assert_eq!(elements[1].id, ElementId::new(2, 1));
    }

    #[test]
    fn test_crop_element_dimensions() {
        let image = RgbImage::from_pixel(200, 200, image::Rgb([255, 255, 255]));
        let element = Element::new(
            ElementId::new(1, 0),
            ElementType::Image,
            BoundingBox::new(50, 50, 150, 100),
            1,
        );
        let crop = crop_element(&image, &element, 0);
        assert_eq!(crop.dimensions(), (100, 50));

        let padded = crop_element(&image, &element, 10);
        assert_eq!(padded.dimensions(), (120, 70));

        // padding clamps at the page edge
        let edge = Element::new(
            ElementId::new(1, 1),
            ElementType::Image,
            BoundingBox::new(0, 0, 100, 50),
            1,
        );
        let crop = crop_element(&image, &edge, 10);
        assert_eq!(crop.dimensions(), (110, 60));
    }
}
