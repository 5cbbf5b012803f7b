use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdCardError {
    /// The input could not be decoded, or has a zero dimension.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("OCR engine unavailable: built without the `tesseract` feature")]
    OcrUnavailable,

    #[error("Unknown card face: {0}")]
    UnknownFace(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IdCardError {
    /// Whether the caller should report this as a problem with the submitted
    /// image rather than an internal failure.
    pub fn is_user_error(&self) -> bool {
        matches!(self, IdCardError::InvalidImage(_) | IdCardError::UnknownFace(_))
    }
}
