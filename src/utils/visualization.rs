//! Overlay visualizations for extracted elements.
//!
//! This module renders bounding box overlays on a copy of the page image,
//! either for a single element type (`{type}_only.jpg`) or for all types at
//! once with a legend (`all_types_colored.jpg`). Each element type draws in a
//! fixed color; title boxes draw with a thicker border. The source image is
//! never mutated.
//!
//! # Examples
//!
//! ```rust,no_run
//! use doc_grounding::utils::visualization::{OverlayConfig, render_all_overlays};
//! # use doc_grounding::domain::Element;
//! # fn demo(page: &image::RgbImage, elements: &[Element]) -> Result<(), Box<dyn std::error::Error>> {
//! let config = OverlayConfig::with_system_font();
//! let paths = render_all_overlays(page, elements, std::path::Path::new("out/overlays"), &config)?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info};

use crate::core::errors::{ExtractError, ExtractResult};
use crate::domain::{Element, ElementType};
use crate::processors::BoundingBox;

const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const LEGEND_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Returns the fixed overlay color for an element type.
pub fn type_color(element_type: ElementType) -> Rgb<u8> {
    match element_type {
        ElementType::Title => Rgb([255, 0, 0]),
        ElementType::Paragraph => Rgb([0, 255, 0]),
        ElementType::Image => Rgb([0, 0, 255]),
        ElementType::Table => Rgb([255, 165, 0]),
        ElementType::Equation => Rgb([255, 0, 255]),
        ElementType::Caption => Rgb([0, 255, 255]),
        ElementType::List => Rgb([255, 255, 0]),
        ElementType::Header => Rgb([128, 0, 128]),
        ElementType::Footer => Rgb([128, 128, 128]),
        ElementType::Unknown => Rgb([200, 200, 200]),
    }
}

/// Configuration for overlay rendering.
///
/// Controls font settings and bounding box styling. When no font is
/// available, boxes render without labels and the legend renders swatches
/// only.
pub struct OverlayConfig {
    /// The font to use for labels and the legend. If None, text is skipped.
    pub font: Option<FontVec>,

    /// The scale factor for the font. Defaults to 16.0.
    pub font_scale: f32,

    /// The thickness of bounding box lines. Defaults to 2.
    pub bbox_thickness: i32,

    /// The thickness used for title boxes. Defaults to 4.
    pub title_thickness: i32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font: None,
            font_scale: 16.0,
            bbox_thickness: 2,
            title_thickness: 4,
        }
    }
}

impl OverlayConfig {
    /// Creates an OverlayConfig with a font loaded from the specified path.
    pub fn with_font_path(font_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data)
            .map_err(|_| format!("Failed to parse font file: {}", font_path.display()))?;

        Ok(Self {
            font: Some(font),
            ..Self::default()
        })
    }

    /// Creates an OverlayConfig with a system font.
    ///
    /// Attempts to load a font from common system locations, falling back to
    /// the default configuration when none is found.
    pub fn with_system_font() -> Self {
        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path) {
                if let Ok(font) = FontVec::try_from_vec(font_data) {
                    info!("Loaded system font: {}", path);
                    return Self {
                        font: Some(font),
                        ..Self::default()
                    };
                }
            }
        }

        debug!("No system font found, overlay labels will be skipped");
        Self::default()
    }

    fn thickness_for(&self, element_type: ElementType) -> i32 {
        if element_type == ElementType::Title {
            self.title_thickness
        } else {
            self.bbox_thickness
        }
    }
}

/// Renders an overlay showing only the elements of one type.
///
/// Returns a copy of the page image with the matching boxes drawn in the
/// type's color.
pub fn render_type_overlay(
    image: &RgbImage,
    elements: &[Element],
    element_type: ElementType,
    config: &OverlayConfig,
) -> RgbImage {
    let mut overlay = image.clone();
    for element in elements.iter().filter(|e| e.element_type == element_type) {
        draw_element_box(&mut overlay, element, config);
    }
    overlay
}

/// Renders an overlay showing every element in its type color, with a legend
/// listing type counts in the top-left corner.
pub fn render_combined_overlay(
    image: &RgbImage,
    elements: &[Element],
    config: &OverlayConfig,
) -> RgbImage {
    let mut overlay = image.clone();
    for element in elements {
        draw_element_box(&mut overlay, element, config);
    }

    let counts = count_by_type(elements);
    draw_legend(&mut overlay, &counts, config);
    overlay
}

/// Renders and saves one overlay per element type present plus the combined
/// overlay, returning the written paths.
///
/// Per-type overlays are named `{type}_only.jpg`; the combined overlay is
/// `all_types_colored.jpg`.
pub fn render_all_overlays(
    image: &RgbImage,
    elements: &[Element],
    out_dir: &Path,
    config: &OverlayConfig,
) -> ExtractResult<Vec<PathBuf>> {
    if !out_dir.exists() {
        std::fs::create_dir_all(out_dir)?;
    }

    let mut paths = Vec::new();
    for &element_type in ElementType::all() {
        if !elements.iter().any(|e| e.element_type == element_type) {
            continue;
        }
        let overlay = render_type_overlay(image, elements, element_type, config);
        let path = out_dir.join(format!("{}_only.jpg", element_type.as_str()));
        overlay.save(&path).map_err(|e| {
            ExtractError::persistence(&format!("writing overlay {}", path.display()), e)
        })?;
        paths.push(path);
    }

    let combined = render_combined_overlay(image, elements, config);
    let path = out_dir.join("all_types_colored.jpg");
    combined.save(&path).map_err(|e| {
        ExtractError::persistence(&format!("writing overlay {}", path.display()), e)
    })?;
    paths.push(path);

    debug!(overlays = paths.len(), dir = %out_dir.display(), "rendered overlays");
    Ok(paths)
}

/// Draws one element's bounding box and, when a font is available, its type
/// label just above the box.
fn draw_element_box(img: &mut RgbImage, element: &Element, config: &OverlayConfig) {
    let Some(rect) = bbox_to_rect(&element.bbox) else {
        return;
    };
    let color = type_color(element.element_type);
    let (img_width, img_height) = (img.width() as i32, img.height() as i32);

    for thickness in 0..config.thickness_for(element.element_type) {
        let thick_rect = Rect::at(rect.left() - thickness, rect.top() - thickness).of_size(
            rect.width() + (2 * thickness) as u32,
            rect.height() + (2 * thickness) as u32,
        );

        if is_rect_in_bounds(&thick_rect, img_width, img_height) {
            draw_hollow_rect_mut(img, thick_rect, color);
        }
    }

    if let Some(ref font) = config.font {
        let label_y = rect.top() - config.font_scale as i32 - 2;
        if label_y >= 0 && rect.left() >= 0 && rect.left() < img_width {
            draw_text_mut(
                img,
                color,
                rect.left(),
                label_y,
                config.font_scale,
                font,
                element.element_type.as_str(),
            );
        }
    }
}

/// Draws the legend in the top-left corner: one color swatch per type present
/// with `type: count` text when a font is available.
fn draw_legend(
    img: &mut RgbImage,
    counts: &BTreeMap<&'static str, (ElementType, usize)>,
    config: &OverlayConfig,
) {
    const SWATCH: u32 = 14;
    const MARGIN: i32 = 8;
    const ROW_HEIGHT: i32 = 20;

    if counts.is_empty() {
        return;
    }

    let rows = counts.len() as i32;
    let panel_height = (rows * ROW_HEIGHT + MARGIN) as u32;
    let panel_width = 160u32.min(img.width());
    if panel_height + (MARGIN as u32) < img.height() {
        let panel = Rect::at(MARGIN / 2, MARGIN / 2).of_size(panel_width, panel_height);
        draw_filled_rect_mut(img, panel, LEGEND_BACKGROUND);
    }

    // Rows follow the fixed element type order, not the BTreeMap key order.
    let mut row = 0;
    for &element_type in ElementType::all() {
        let Some(&(_, count)) = counts.get(element_type.as_str()) else {
            continue;
        };
        let y = MARGIN + row * ROW_HEIGHT;
        let swatch = Rect::at(MARGIN, y).of_size(SWATCH, SWATCH);
        if is_rect_in_bounds(&swatch, img.width() as i32, img.height() as i32) {
            draw_filled_rect_mut(img, swatch, type_color(element_type));
        }

        if let Some(ref font) = config.font {
            let text = format!("{}: {}", element_type.as_str(), count);
            draw_text_mut(
                img,
                TEXT_COLOR,
                MARGIN + SWATCH as i32 + 6,
                y,
                config.font_scale,
                font,
                &text,
            );
        }
        row += 1;
    }
}

fn count_by_type(elements: &[Element]) -> BTreeMap<&'static str, (ElementType, usize)> {
    let mut counts: BTreeMap<&'static str, (ElementType, usize)> = BTreeMap::new();
    for element in elements {
        counts
            .entry(element.element_type.as_str())
            .or_insert((element.element_type, 0))
            .1 += 1;
    }
    counts
}

fn is_rect_in_bounds(rect: &Rect, img_width: i32, img_height: i32) -> bool {
    rect.left() >= 0 && rect.top() >= 0 && rect.right() < img_width && rect.bottom() < img_height
}

/// Converts a pixel bounding box to a Rect, or None when degenerate.
fn bbox_to_rect(bbox: &BoundingBox) -> Option<Rect> {
    let width = bbox.width();
    let height = bbox.height();
    (width > 0 && height > 0)
        .then(|| Rect::at(bbox.x0 as i32, bbox.y0 as i32).of_size(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ElementId;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn test_element(index: u32, element_type: ElementType, bbox: BoundingBox) -> Element {
        Element::new(ElementId::new(1, index), element_type, bbox, 1)
    }

    #[test]
    fn test_type_colors_fixed() {
        assert_eq!(type_color(ElementType::Title), Rgb([255, 0, 0]));
        assert_eq!(type_color(ElementType::Table), Rgb([255, 165, 0]));
        assert_eq!(type_color(ElementType::Unknown), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_type_overlay_draws_only_matching_type() {
        let image = create_test_image(200, 200);
        let elements = vec![
            test_element(0, ElementType::Title, BoundingBox::new(20, 20, 100, 60)),
            test_element(1, ElementType::Paragraph, BoundingBox::new(20, 100, 100, 160)),
        ];
        let config = OverlayConfig::default();
        let overlay = render_type_overlay(&image, &elements, ElementType::Title, &config);

        // title border drawn in red
        assert_eq!(*overlay.get_pixel(20, 20), Rgb([255, 0, 0]));
        // paragraph box untouched in the title-only overlay
        assert_eq!(*overlay.get_pixel(20, 100), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_combined_overlay_draws_all_types() {
        let image = create_test_image(400, 400);
        let elements = vec![
            test_element(0, ElementType::Title, BoundingBox::new(200, 200, 300, 250)),
            test_element(1, ElementType::Paragraph, BoundingBox::new(200, 300, 300, 360)),
        ];
        let config = OverlayConfig::default();
        let overlay = render_combined_overlay(&image, &elements, &config);

        assert_eq!(*overlay.get_pixel(200, 200), Rgb([255, 0, 0]));
        assert_eq!(*overlay.get_pixel(200, 300), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_source_image_is_not_mutated() {
        let image = create_test_image(200, 200);
        let elements = vec![test_element(
            0,
            ElementType::Title,
            BoundingBox::new(20, 20, 100, 60),
        )];
        let config = OverlayConfig::default();
        let _ = render_combined_overlay(&image, &elements, &config);
        assert_eq!(*image.get_pixel(20, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_render_all_overlays_file_names() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image = create_test_image(200, 200);
        let elements = vec![
            test_element(0, ElementType::Title, BoundingBox::new(20, 20, 100, 60)),
            test_element(1, ElementType::Table, BoundingBox::new(20, 100, 100, 160)),
        ];
        let config = OverlayConfig::default();
        let paths = render_all_overlays(&image, &elements, dir.path(), &config)?;

        let names: Vec<_> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["title_only.jpg", "table_only.jpg", "all_types_colored.jpg"]);
        for path in &paths {
            assert!(path.exists());
        }
        Ok(())
    }
}
