//! Document structure linking.
//!
//! Takes the extracted elements of a document and produces a
//! [`DocumentStructure`]: a deterministic reading order, groups of contiguous
//! text runs, and per-page summaries. Duplicate element ids are the one
//! contract violation the pipeline treats as fatal.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::core::errors::{ExtractError, ExtractResult};
use crate::domain::{DocumentStructure, Element, ElementGroup, ElementType};

/// Pixel geometry of one page, needed to scale the grouping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    /// Page number, counting from 1.
    pub page: u32,
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
}

impl PageGeometry {
    pub fn new(page: u32, width: u32, height: u32) -> Self {
        Self {
            page,
            width,
            height,
        }
    }
}

/// Configuration for the structure linker.
#[derive(Debug, Clone)]
pub struct LinkerConfig {
    /// Maximum vertical gap between consecutive same-type text elements for
    /// them to merge into one group, as a fraction of the page height.
    pub max_vertical_gap_ratio: f32,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            max_vertical_gap_ratio: 0.02,
        }
    }
}

/// Links extracted elements into a document structure.
///
/// Reading order is a stable sort by (page, top edge, left edge); every
/// element receives a `reading_order_index` and the indices form a
/// permutation of `0..N`. Contiguous runs of the same text-bearing type on
/// one page merge into a group while the vertical gap between consecutive
/// boxes stays under `config.max_vertical_gap_ratio` of the page height;
/// tables, images, and equations always form singleton groups, as do
/// unknown-type elements without a text span. Every element
/// carries a `group_id` back-reference to its containing group; groups hold
/// only id lists and never own elements.
///
/// # Errors
///
/// Returns [`ExtractError::StructuralInconsistency`] when two elements share
/// an id, or [`ExtractError::InvalidInput`] when an element references a page
/// absent from `pages`.
pub fn link_document(
    mut elements: Vec<Element>,
    pages: &[PageGeometry],
    config: &LinkerConfig,
) -> ExtractResult<DocumentStructure> {
    let mut seen = HashSet::with_capacity(elements.len());
    for element in &elements {
        if !seen.insert(element.id) {
            return Err(ExtractError::duplicate_id(element.id));
        }
    }

    elements.sort_by_key(|e| (e.page, e.bbox.y0, e.bbox.x0));
    for (order, element) in elements.iter_mut().enumerate() {
        element.reading_order_index = Some(order as u32);
    }

    let groups = build_groups(&mut elements, pages, config)?;
    debug!(
        elements = elements.len(),
        groups = groups.len(),
        "linked document structure"
    );

    let mut structure = DocumentStructure::new();
    structure.elements = elements;
    structure.groups = groups;
    structure.rebuild_summaries();
    Ok(structure)
}

fn page_height(pages: &[PageGeometry], page: u32) -> ExtractResult<u32> {
    pages
        .iter()
        .find(|p| p.page == page)
        .map(|p| p.height)
        .ok_or_else(|| {
            ExtractError::invalid_input(format!("no page geometry for page {}", page))
        })
}

/// Whether an element can merge into a multi-element text run. Unknown-type
/// elements qualify only when they carry a text span.
fn joins_text_run(element: &Element) -> bool {
    element.element_type.is_text_bearing()
        && (element.element_type != ElementType::Unknown || element.text.is_some())
}

fn build_groups(
    elements: &mut [Element],
    pages: &[PageGeometry],
    config: &LinkerConfig,
) -> ExtractResult<BTreeMap<u32, ElementGroup>> {
    let mut groups: BTreeMap<u32, ElementGroup> = BTreeMap::new();
    let mut prev: Option<(ElementType, u32, u32, bool)> = None;
    let mut current_group = 0u32;

    for element in elements.iter_mut() {
        let height = page_height(pages, element.page)?;
        let max_gap = config.max_vertical_gap_ratio * height as f32;

        // Elements arrive in reading order, so the merge candidate is always
        // the immediately preceding element.
        let merges = prev.is_some_and(|(prev_type, prev_page, prev_y1, prev_joins)| {
            joins_text_run(element)
                && prev_joins
                && prev_type == element.element_type
                && prev_page == element.page
                && (element.bbox.y0.saturating_sub(prev_y1) as f32) < max_gap
        });

        if !merges {
            current_group = groups.len() as u32;
            groups.insert(
                current_group,
                ElementGroup {
                    group_type: element.element_type,
                    element_ids: Vec::new(),
                },
            );
        }
        if let Some(group) = groups.get_mut(&current_group) {
            group.element_ids.push(element.id);
        }
        element.group_id = Some(current_group);
        prev = Some((
            element.element_type,
            element.page,
            element.bbox.y1,
            joins_text_run(element),
        ));
    }

    Ok(groups)
}
