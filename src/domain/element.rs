//! Typed document elements extracted from grounded OCR output.

use serde::{Deserialize, Serialize};

use crate::processors::BoundingBox;

/// Semantic type of a document element.
///
/// The original model label is preserved in [`Element::label`]; labels the
/// vocabulary does not cover map to [`ElementType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Document or section title
    Title,
    /// Body text paragraph
    Paragraph,
    /// Image or figure
    Image,
    /// Table
    Table,
    /// Mathematical formula
    Equation,
    /// Figure or table caption
    Caption,
    /// List items
    List,
    /// Page header
    Header,
    /// Page footer
    Footer,
    /// Unrecognized label (original preserved in Element.label)
    Unknown,
}

impl ElementType {
    /// Returns the canonical lowercase name used in filenames and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Title => "title",
            ElementType::Paragraph => "paragraph",
            ElementType::Image => "image",
            ElementType::Table => "table",
            ElementType::Equation => "equation",
            ElementType::Caption => "caption",
            ElementType::List => "list",
            ElementType::Header => "header",
            ElementType::Footer => "footer",
            ElementType::Unknown => "unknown",
        }
    }

    /// Maps a model output label to an element type.
    ///
    /// Matching is case-insensitive. Unrecognized labels map to `Unknown`
    /// rather than failing.
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "title" => ElementType::Title,
            "text" | "paragraph" => ElementType::Paragraph,
            "figure" | "image" => ElementType::Image,
            "table" => ElementType::Table,
            "formula" | "equation" => ElementType::Equation,
            "caption" => ElementType::Caption,
            "list" => ElementType::List,
            "header" => ElementType::Header,
            "footer" => ElementType::Footer,
            _ => ElementType::Unknown,
        }
    }

    /// Whether elements of this type carry running text and may merge into
    /// multi-element groups during linking.
    ///
    /// Tables, images, and equations are visual blocks; they stay singleton.
    pub fn is_text_bearing(&self) -> bool {
        !matches!(
            self,
            ElementType::Table | ElementType::Image | ElementType::Equation
        )
    }

    /// All element types, in overlay rendering order.
    pub fn all() -> &'static [ElementType] {
        &[
            ElementType::Title,
            ElementType::Paragraph,
            ElementType::Image,
            ElementType::Table,
            ElementType::Equation,
            ElementType::Caption,
            ElementType::List,
            ElementType::Header,
            ElementType::Footer,
            ElementType::Unknown,
        ]
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable element identifier, unique per document as a (page, index) pair.
///
/// Formats as `page_0003_elem_0012` and serializes as that string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ElementId {
    /// Page number, counting from 1.
    pub page: u32,
    /// Zero-based index in extraction order within the page.
    pub index: u32,
}

impl ElementId {
    pub fn new(page: u32, index: u32) -> Self {
        Self { page, index }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page_{:04}_elem_{:04}", self.page, self.index)
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for ElementId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let rest = value
            .strip_prefix("page_")
            .ok_or_else(|| format!("invalid element id '{}'", value))?;
        let (page, index) = rest
            .split_once("_elem_")
            .ok_or_else(|| format!("invalid element id '{}'", value))?;
        let page = page
            .parse::<u32>()
            .map_err(|_| format!("invalid page in element id '{}'", value))?;
        let index = index
            .parse::<u32>()
            .map_err(|_| format!("invalid index in element id '{}'", value))?;
        Ok(ElementId { page, index })
    }
}

/// Geometry metrics derived from an element's pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBoxMetrics {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Area in pixels.
    pub area: u64,
    /// Width over height, `0.0` when the height is zero.
    pub aspect_ratio: f64,
}

impl BBoxMetrics {
    /// Computes metrics for a pixel bounding box.
    pub fn of(bbox: &BoundingBox) -> Self {
        Self {
            width: bbox.width(),
            height: bbox.height(),
            area: bbox.area(),
            aspect_ratio: bbox.aspect_ratio(),
        }
    }
}

/// A typed document element with pixel geometry and extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable id, unique per document.
    pub id: ElementId,
    /// Semantic type of the element.
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Original model label, preserved verbatim.
    pub label: String,
    /// Bounding box in page pixel coordinates.
    pub bbox: BoundingBox,
    /// Page number, counting from 1.
    pub page: u32,
    /// Text span attached to the grounding reference, if any. Serializes as
    /// a plain string, empty when absent, so the metadata JSON stays
    /// type-stable for downstream consumers.
    #[serde(with = "text_field")]
    pub text: Option<String>,
    /// Geometry metrics derived from the bounding box.
    #[serde(flatten)]
    pub metrics: BBoxMetrics,
    /// Position in the document reading order, assigned during linking.
    pub reading_order_index: Option<u32>,
    /// Id of the containing group, assigned during linking. A back-reference
    /// for lookup only; groups never own elements.
    pub group_id: Option<u32>,
}

impl Element {
    /// Creates a new element. Metrics are derived from the bounding box.
    pub fn new(id: ElementId, element_type: ElementType, bbox: BoundingBox, page: u32) -> Self {
        Self {
            id,
            element_type,
            label: element_type.as_str().to_string(),
            bbox,
            page,
            text: None,
            metrics: BBoxMetrics::of(&bbox),
            reading_order_index: None,
            group_id: None,
        }
    }

    /// Sets the original model label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the text span. Empty spans are stored as `None`.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.is_empty() { None } else { Some(text) };
        self
    }
}

mod text_field {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(text: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(text.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(if raw.is_empty() { None } else { Some(raw) })
    }
}
