//! Per-element crop persistence.
//!
//! Each saved element produces two files in the output directory: the crop
//! itself as `{id}_{type}.jpg` and a JSON metadata file `{id}_{type}.json`
//! carrying the element's id, type, text, bbox, page, and geometry metrics.
//! Batch saves continue past individual failures and report a tally.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, warn};

use crate::core::errors::{ExtractError, ExtractResult};
use crate::domain::{Element, ElementId};
use crate::pipeline::extractor::crop_element;

/// Paths produced by saving one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedElement {
    /// Id of the saved element.
    pub id: ElementId,
    /// Path of the written crop image.
    pub image_path: PathBuf,
    /// Path of the written metadata JSON.
    pub metadata_path: PathBuf,
}

/// Outcome of a batch save.
#[derive(Debug, Default)]
pub struct BatchSaveReport {
    /// Crop path per successfully saved element.
    pub saved: BTreeMap<ElementId, PathBuf>,
    /// Number of elements that failed to save.
    pub failed: usize,
}

impl BatchSaveReport {
    /// Number of successfully saved elements.
    pub fn saved_count(&self) -> usize {
        self.saved.len()
    }
}

/// Crops one element out of the page image and writes the crop plus its
/// metadata JSON into `out_dir`.
///
/// The source image is never mutated. `padding` expands the crop window
/// symmetrically, clamped to the page.
pub fn save_element(
    image: &RgbImage,
    element: &Element,
    out_dir: &Path,
    padding: u32,
) -> ExtractResult<SavedElement> {
    let stem = format!("{}_{}", element.id, element.element_type.as_str());
    let image_path = out_dir.join(format!("{}.jpg", stem));
    let metadata_path = out_dir.join(format!("{}.json", stem));

    let crop = crop_element(image, element, padding);
    crop.save(&image_path).map_err(|e| {
        ExtractError::persistence(&format!("writing crop {}", image_path.display()), e)
    })?;

    let metadata_file = std::fs::File::create(&metadata_path)?;
    serde_json::to_writer_pretty(metadata_file, element)?;

    debug!(id = %element.id, path = %image_path.display(), "saved element crop");
    Ok(SavedElement {
        id: element.id,
        image_path,
        metadata_path,
    })
}

/// Saves all elements into `out_dir`, creating the directory if needed.
///
/// Individual failures are logged and tallied; the batch keeps going.
pub fn save_all_elements(
    image: &RgbImage,
    elements: &[Element],
    out_dir: &Path,
    padding: u32,
) -> ExtractResult<BatchSaveReport> {
    if !out_dir.exists() {
        std::fs::create_dir_all(out_dir)?;
    }

    let mut report = BatchSaveReport::default();
    for element in elements {
        match save_element(image, element, out_dir, padding) {
            Ok(saved) => {
                report.saved.insert(saved.id, saved.image_path);
            }
            Err(e) => {
                warn!(id = %element.id, error = %e, "failed to save element");
                report.failed += 1;
            }
        }
    }

    debug!(
        saved = report.saved_count(),
        failed = report.failed,
        "batch element save finished"
    );
    Ok(report)
}
