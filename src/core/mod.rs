//! Core error handling for the extraction pipeline.

pub mod errors;

pub use errors::{ExtractError, ExtractResult};
