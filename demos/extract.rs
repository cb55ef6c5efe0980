//! Grounded Extraction Example
//!
//! Runs the full extraction pipeline on one page: raw grounded OCR output
//! plus the page image in, structured JSON, per-element crops, and overlay
//! visualizations out.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example extract -- \
//!     --raw-output page.txt \
//!     --image page.jpg \
//!     --out-dir out
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use doc_grounding::prelude::*;
use doc_grounding::utils::init_tracing;

/// Command-line arguments
#[derive(Parser)]
#[command(name = "extract")]
#[command(about = "Extract structured elements from grounded OCR output")]
struct Args {
    /// Path to the raw model output text for the page
    #[arg(short, long)]
    raw_output: PathBuf,

    /// Path to the page image
    #[arg(short, long)]
    image: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    out_dir: PathBuf,

    /// Page number used in element ids, counting from 1
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Crop padding in pixels
    #[arg(long, default_value_t = 0)]
    crop_padding: u32,

    /// Optional font file for overlay labels
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.raw_output)?;
    let image = image::open(&args.image)?.to_rgb8();
    let (width, height) = image.dimensions();

    let (elements, diagnostics) =
        extract_elements(&raw, args.page, width, height, &ExtractOptions::default());
    info!(
        extracted = elements.len(),
        malformed = diagnostics.malformed_references,
        invalid_geometry = diagnostics.invalid_geometry,
        unknown_types = diagnostics.unknown_types,
        "extraction finished"
    );

    let pages = [PageGeometry::new(args.page, width, height)];
    let structure = link_document(elements, &pages, &LinkerConfig::default())?
        .with_source_file(args.image.display().to_string());

    std::fs::create_dir_all(&args.out_dir)?;
    let elements_json = args.out_dir.join("elements.json");
    serde_json::to_writer_pretty(std::fs::File::create(&elements_json)?, &structure.elements)?;
    structure.save_json(args.out_dir.join("document_structure.json"))?;

    let page_dir = args.out_dir.join(format!("page_{:04}", args.page));
    let report = save_all_elements(
        &image,
        &structure.elements,
        &page_dir.join("elements"),
        args.crop_padding,
    )?;
    info!(
        saved = report.saved_count(),
        failed = report.failed,
        "element crops written"
    );

    let overlay_config = match &args.font {
        Some(path) => OverlayConfig::with_font_path(path)?,
        None => OverlayConfig::with_system_font(),
    };
    let overlays = render_all_overlays(
        &image,
        &structure.elements,
        &page_dir.join("overlays"),
        &overlay_config,
    )?;
    info!(overlays = overlays.len(), out_dir = %args.out_dir.display(), "done");

    Ok(())
}
