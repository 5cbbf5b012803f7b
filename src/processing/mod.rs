pub mod extractors;
pub mod image;
pub mod ocr;

pub use self::extractors::FieldExtractor;
pub use self::image::{ImageNormalizer, NormalizedImage, SourceImage};
pub use self::ocr::{default_recognizer, split_tokens, TextRecognizer};

#[cfg(feature = "tesseract")]
pub use self::ocr::TesseractRecognizer;
