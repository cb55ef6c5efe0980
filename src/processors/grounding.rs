//! Scanner for inline grounding references in raw model output.
//!
//! Grounded OCR models emit references of the form
//! `<|ref|>type<|/ref|><|det|>[[x0,y0,x1,y1]]<|/det|>span text`, interleaved
//! with prose. The scanner walks the input once, yielding one
//! [`RawGroundingReference`] per well-formed box and counting everything it
//! has to drop. Malformed tags never abort the scan; parsing resumes right
//! after the failed opener so well-formed neighbors still come through.

use tracing::warn;

use super::bbox::NormBBox;

const REF_OPEN: &str = "<|ref|>";
const REF_CLOSE: &str = "<|/ref|>";
const DET_OPEN: &str = "<|det|>";
const DET_CLOSE: &str = "<|/det|>";

/// One grounding reference as it appears in the raw model output.
///
/// Coordinates are still in the model's normalized `[0, 999]` space and the
/// type label is carried verbatim; mapping to [`crate::domain::ElementType`]
/// happens during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroundingReference {
    /// Element type label as emitted by the model.
    pub type_label: String,
    /// Normalized bounding box.
    pub bbox: NormBBox,
    /// Text span following the reference, trimmed.
    pub span_text: String,
}

/// Counters for input the scanner had to drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    /// Number of grounding tags dropped for structural violations.
    pub malformed_references: usize,
}

/// Parses all grounding references out of raw model output.
///
/// Returns the well-formed references in input order together with
/// diagnostics. A tag whose det payload holds several boxes yields one
/// reference per box, all sharing the tag's label and span text.
pub fn parse_references(raw: &str) -> (Vec<RawGroundingReference>, ParseDiagnostics) {
    let mut references = Vec::new();
    let mut diagnostics = ParseDiagnostics::default();
    let mut pos = 0;

    while let Some(rel) = raw[pos..].find(REF_OPEN) {
        let start = pos + rel;
        match scan_reference(raw, start) {
            Ok((label, boxes, span_text, next_pos)) => {
                for bbox in boxes {
                    references.push(RawGroundingReference {
                        type_label: label.to_string(),
                        bbox,
                        span_text: span_text.to_string(),
                    });
                }
                pos = next_pos;
            }
            Err(reason) => {
                warn!(offset = start, %reason, "dropping malformed grounding reference");
                diagnostics.malformed_references += 1;
                pos = start + REF_OPEN.len();
            }
        }
    }

    (references, diagnostics)
}

/// Scans one reference starting at the `<|ref|>` opener at `start`.
///
/// On success returns the label, the parsed boxes, the trimmed span text, and
/// the offset where scanning should continue (the next opener or end of
/// input).
fn scan_reference(raw: &str, start: usize) -> Result<(&str, Vec<NormBBox>, &str, usize), String> {
    let label_start = start + REF_OPEN.len();
    let label_end = raw[label_start..]
        .find(REF_CLOSE)
        .map(|i| label_start + i)
        .ok_or_else(|| format!("missing {} marker", REF_CLOSE))?;
    let label = raw[label_start..label_end].trim();

    // The det block must follow the ref closer immediately.
    let det_open = label_end + REF_CLOSE.len();
    if !raw[det_open..].starts_with(DET_OPEN) {
        return Err(format!("expected {} after type label", DET_OPEN));
    }

    let payload_start = det_open + DET_OPEN.len();
    let payload_end = raw[payload_start..]
        .find(DET_CLOSE)
        .map(|i| payload_start + i)
        .ok_or_else(|| format!("missing {} marker", DET_CLOSE))?;
    let boxes = parse_det_payload(&raw[payload_start..payload_end])?;

    let span_start = payload_end + DET_CLOSE.len();
    let span_end = raw[span_start..]
        .find(REF_OPEN)
        .map(|i| span_start + i)
        .unwrap_or(raw.len());
    let span_text = raw[span_start..span_end].trim();

    Ok((label, boxes, span_text, span_end))
}

/// Parses a det payload of the form `[[x0,y0,x1,y1], ...]`.
fn parse_det_payload(payload: &str) -> Result<Vec<NormBBox>, String> {
    let trimmed = payload.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| "det payload is not a bracketed list".to_string())?;

    let mut boxes = Vec::new();
    let mut rest = inner.trim_start();

    while !rest.is_empty() {
        let group = rest
            .strip_prefix('[')
            .ok_or_else(|| "expected '[' starting a coordinate group".to_string())?;
        let close = group
            .find(']')
            .ok_or_else(|| "unclosed coordinate group".to_string())?;

        let coords: Vec<i32> = group[..close]
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<i32>()
                    .map_err(|_| format!("non-numeric coordinate '{}'", c.trim()))
            })
            .collect::<Result<_, _>>()?;
        if coords.len() != 4 {
            return Err(format!("expected 4 coordinates, got {}", coords.len()));
        }
        boxes.push(NormBBox::new(coords[0], coords[1], coords[2], coords[3]));

        rest = group[close + 1..].trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        } else if !rest.is_empty() {
            return Err("expected ',' between coordinate groups".to_string());
        }
    }

    if boxes.is_empty() {
        return Err("det payload holds no coordinate groups".to_string());
    }
    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_reference() {
        let raw = "<|ref|>title<|/ref|><|det|>[[125, 50, 875, 100]]<|/det|>Introduction";
        let (refs, diag) = parse_references(raw);
        assert_eq!(refs.len(), 1);
        assert_eq!(diag.malformed_references, 0);
        assert_eq!(refs[0].type_label, "title");
        assert_eq!(refs[0].bbox, NormBBox::new(125, 50, 875, 100));
        assert_eq!(refs[0].span_text, "Introduction");
    }

    #[test]
    fn test_parse_multiple_references_with_prose() {
        let raw = "preamble <|ref|>title<|/ref|><|det|>[[0,0,500,50]]<|/det|>Heading\n\
                   <|ref|>text<|/ref|><|det|>[[0,60,500,200]]<|/det|>Body paragraph.";
        let (refs, diag) = parse_references(raw);
        assert_eq!(refs.len(), 2);
        assert_eq!(diag.malformed_references, 0);
        assert_eq!(refs[0].span_text, "Heading");
        assert_eq!(refs[1].type_label, "text");
        assert_eq!(refs[1].span_text, "Body paragraph.");
    }

    #[test]
    fn test_multi_box_payload_shares_span() {
        let raw = "<|ref|>text<|/ref|><|det|>[[0,0,100,50], [0,60,100,110]]<|/det|>Split run";
        let (refs, diag) = parse_references(raw);
        assert_eq!(refs.len(), 2);
        assert_eq!(diag.malformed_references, 0);
        assert_eq!(refs[0].span_text, "Split run");
        assert_eq!(refs[1].span_text, "Split run");
        assert_eq!(refs[1].bbox, NormBBox::new(0, 60, 100, 110));
    }

    #[test]
    fn test_malformed_between_good_neighbors() {
        let raw = "<|ref|>title<|/ref|><|det|>[[0,0,500,50]]<|/det|>Good\
                   <|ref|>text<|/ref|><|det|>[[0,60,oops,110]]<|/det|>Bad\
                   <|ref|>text<|/ref|><|det|>[[0,120,500,170]]<|/det|>Also good";
        let (refs, diag) = parse_references(raw);
        assert_eq!(refs.len(), 2);
        assert_eq!(diag.malformed_references, 1);
        assert_eq!(refs[0].span_text, "Good");
        assert_eq!(refs[1].span_text, "Also good");
    }

    #[test]
    fn test_unclosed_det_is_malformed() {
        let raw = "<|ref|>text<|/ref|><|det|>[[0,0,100,50]] trailing prose";
        let (refs, diag) = parse_references(raw);
        assert!(refs.is_empty());
        assert_eq!(diag.malformed_references, 1);
    }

    #[test]
    fn test_missing_det_block_is_malformed() {
        let raw = "<|ref|>text<|/ref|>no det here";
        let (refs, diag) = parse_references(raw);
        assert!(refs.is_empty());
        assert_eq!(diag.malformed_references, 1);
    }

    #[test]
    fn test_wrong_arity_is_malformed() {
        let raw = "<|ref|>text<|/ref|><|det|>[[0,0,100]]<|/det|>three coords";
        let (refs, diag) = parse_references(raw);
        assert!(refs.is_empty());
        assert_eq!(diag.malformed_references, 1);
    }

    #[test]
    fn test_unknown_label_is_carried_verbatim() {
        let raw = "<|ref|>sidebar<|/ref|><|det|>[[0,0,100,50]]<|/det|>text";
        let (refs, diag) = parse_references(raw);
        assert_eq!(refs.len(), 1);
        assert_eq!(diag.malformed_references, 0);
        assert_eq!(refs[0].type_label, "sidebar");
    }

    #[test]
    fn test_empty_input() {
        let (refs, diag) = parse_references("");
        assert!(refs.is_empty());
        assert_eq!(diag.malformed_references, 0);
    }

    #[test]
    fn test_span_text_runs_to_end_of_input() {
        let raw = "<|ref|>text<|/ref|><|det|>[[0,0,100,50]]<|/det|>  tail text  ";
        let (refs, _) = parse_references(raw);
        assert_eq!(refs[0].span_text, "tail text");
    }
}
