//! Linked document structure types.
//!
//! A [`DocumentStructure`] is the output of the structure linker: every
//! extracted element carries a reading order index, contiguous text runs are
//! grouped, and per-page summaries are tallied for the persisted
//! `document_structure.json`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::element::{Element, ElementId, ElementType};

/// A group of elements that belong together in the reading flow.
///
/// Groups hold only element ids; the elements themselves live in
/// [`DocumentStructure::elements`] and carry a `group_id` back-reference.
/// Text-bearing runs may span several elements, visual blocks (tables,
/// images, equations) are always singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementGroup {
    /// Shared type of the grouped elements.
    pub group_type: ElementType,
    /// Ids of the member elements, in reading order.
    pub element_ids: Vec<ElementId>,
}

/// Per-page element tally for the document summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Page number, counting from 1.
    pub page: u32,
    /// Number of elements on the page.
    pub num_elements: usize,
    /// Count of elements per type name.
    pub element_types: BTreeMap<String, usize>,
}

/// Document-level metadata written alongside the structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source file the document came from, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Number of pages covered by the structure.
    pub num_pages: usize,
    /// Total number of elements across all pages.
    pub total_elements: usize,
}

/// The linked structure of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Document-level metadata.
    pub document_metadata: DocumentMetadata,
    /// All elements in reading order, with `reading_order_index` set.
    pub elements: Vec<Element>,
    /// Element groups keyed by group id, in reading order.
    pub groups: BTreeMap<u32, ElementGroup>,
    /// Per-page element summaries.
    pub pages: Vec<PageSummary>,
}

impl DocumentStructure {
    /// Creates an empty document structure.
    pub fn new() -> Self {
        Self {
            document_metadata: DocumentMetadata::default(),
            elements: Vec::new(),
            groups: BTreeMap::new(),
            pages: Vec::new(),
        }
    }

    /// Sets the source file in the document metadata.
    pub fn with_source_file(mut self, source: impl Into<String>) -> Self {
        self.document_metadata.source_file = Some(source.into());
        self
    }

    /// Looks up an element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Recomputes per-page summaries and document totals from the elements.
    pub fn rebuild_summaries(&mut self) {
        let mut per_page: BTreeMap<u32, BTreeMap<String, usize>> = BTreeMap::new();
        for element in &self.elements {
            *per_page
                .entry(element.page)
                .or_default()
                .entry(element.element_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        self.pages = per_page
            .into_iter()
            .map(|(page, element_types)| PageSummary {
                page,
                num_elements: element_types.values().sum(),
                element_types,
            })
            .collect();
        self.document_metadata.num_pages = self.pages.len();
        self.document_metadata.total_elements = self.elements.len();
    }

    /// Writes the structure as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> crate::core::ExtractResult<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl Default for DocumentStructure {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::BoundingBox;

    fn element(page: u32, index: u32, ty: ElementType) -> Element {
        Element::new(
            ElementId::new(page, index),
            ty,
            BoundingBox::new(0, 0, 100, 50),
            page,
        )
    }

    #[test]
    fn test_rebuild_summaries() {
        let mut structure = DocumentStructure::new();
        structure.elements = vec![
            element(1, 0, ElementType::Title),
            element(1, 1, ElementType::Paragraph),
            element(2, 0, ElementType::Paragraph),
        ];
        structure.rebuild_summaries();

        assert_eq!(structure.document_metadata.num_pages, 2);
        assert_eq!(structure.document_metadata.total_elements, 3);
        assert_eq!(structure.pages[0].num_elements, 2);
        assert_eq!(structure.pages[0].element_types.get("title"), Some(&1));
        assert_eq!(structure.pages[1].element_types.get("paragraph"), Some(&1));
    }

    #[test]
    fn test_element_lookup() {
        let mut structure = DocumentStructure::new();
        structure.elements = vec![element(1, 0, ElementType::Title)];
        assert!(structure.element(ElementId::new(1, 0)).is_some());
        assert!(structure.element(ElementId::new(1, 9)).is_none());
    }
}
