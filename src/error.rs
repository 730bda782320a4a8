//! Error types shared across the crate.

use thiserror::Error;

use crate::qrcode::DataTooLong;

/// Main error type for pixrust operations.
#[derive(Debug, Error)]
pub enum PixError {
    /// A payload field failed validation before any encoding work.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending input field.
        field: &'static str,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// The payload text does not fit in the largest supported QR symbol.
    #[error("payload does not fit in a QR symbol: {0}")]
    Capacity(#[from] DataTooLong),

    /// A rendering option was out of range.
    #[error("invalid render option: {0}")]
    Render(String),

    /// Image encoding error from the underlying codec.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error wrapper (file export only).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PixError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        PixError::Validation { field, reason: reason.into() }
    }
}
