//! Persistence and visualization utilities.
//!
//! This module covers the optional back half of the pipeline: cropping
//! elements out of the page image with JSON metadata, and rendering overlay
//! visualizations. It also provides logging setup for binaries.

pub mod crop;
pub mod visualization;

pub use crop::{BatchSaveReport, SavedElement, save_all_elements, save_element};
pub use visualization::{
    OverlayConfig, render_all_overlays, render_combined_overlay, render_type_overlay, type_color,
};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
