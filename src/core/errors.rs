//! Error types for the extraction pipeline.
//!
//! Recoverable conditions in model output (malformed grounding references,
//! invalid geometry, unknown element labels) never surface here; they are
//! diagnosed, logged, and skipped by the stage that hit them. The variants in
//! this module cover IO and persistence failures plus the one hard contract
//! violation the pipeline can detect: duplicate element ids reaching the
//! structure linker.

use thiserror::Error;

/// Errors produced by the extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred while persisting a crop or metadata file.
    #[error("persistence failed: {context}")]
    Persistence {
        /// Additional context about the failed write.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The element set handed to the linker violated an internal contract.
    ///
    /// This is the only fatal error class in the pipeline; everything wrong
    /// with model output is recoverable and reported through diagnostics.
    #[error("structural inconsistency: {message}")]
    StructuralInconsistency {
        /// A message describing the violated contract.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Serialization error while writing metadata or structure files.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Creates an ExtractError for a failed crop or metadata write.
    pub fn persistence(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an ExtractError for a structural contract violation.
    pub fn structural_inconsistency(message: impl Into<String>) -> Self {
        Self::StructuralInconsistency {
            message: message.into(),
        }
    }

    /// Creates an ExtractError for a duplicate element id seen by the linker.
    pub fn duplicate_id(id: impl std::fmt::Display) -> Self {
        Self::StructuralInconsistency {
            message: format!("duplicate element id '{}'", id),
        }
    }

    /// Creates an ExtractError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ExtractError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

/// A convenient result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
