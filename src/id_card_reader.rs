use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::models::{Face, IdentityRecord};
use crate::processing::{FieldExtractor, ImageNormalizer, SourceImage, TextRecognizer};
use crate::utils::{IdCardError, NormalizerConfig};
use crate::validation::CompletenessValidator;

/// Outcome of reading one face of the card.
///
/// `complete == false` means the caller should ask for a clearer image; the
/// record is then only useful for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub face: Face,
    pub record: IdentityRecord,
    pub complete: bool,
}

/// Runs the full pipeline for one image: decode, normalize, recognize,
/// extract, check.
pub struct IdCardReader<R> {
    recognizer: R,
    normalizer: ImageNormalizer,
    extractor: FieldExtractor,
}

impl<R: TextRecognizer> IdCardReader<R> {
    pub fn new(recognizer: R) -> Self {
        Self::with_config(recognizer, NormalizerConfig::default())
    }

    pub fn with_config(recognizer: R, config: NormalizerConfig) -> Self {
        IdCardReader {
            recognizer,
            normalizer: ImageNormalizer::new(config),
            extractor: FieldExtractor::new(),
        }
    }

    /// Replaces the extractor, e.g. to pin the year dates are compared against.
    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn extract_front(&self, image_bytes: &[u8]) -> Result<Extraction, IdCardError> {
        self.extract(image_bytes, Face::Front)
    }

    pub fn extract_back(&self, image_bytes: &[u8]) -> Result<Extraction, IdCardError> {
        self.extract(image_bytes, Face::Back)
    }

    pub fn extract_file(&self, path: &Path, face: Face) -> Result<Extraction, IdCardError> {
        info!("Reading {} face from {}", face, path.display());
        let source = SourceImage::open(path)?;
        self.extract_source(source, face)
    }

    pub fn extract(&self, image_bytes: &[u8], face: Face) -> Result<Extraction, IdCardError> {
        let source = SourceImage::from_bytes(image_bytes)?;
        self.extract_source(source, face)
    }

    pub fn extract_source(&self, source: SourceImage, face: Face) -> Result<Extraction, IdCardError> {
        // Step 1: bring the image to a size and encoding the engine handles well
        let normalized = self.normalizer.normalize(source)?;

        // Step 2: OCR
        let tokens = self.recognizer.recognize(&normalized.image)?;
        info!("OCR produced {} tokens", tokens.len());

        // Step 3: classify tokens and check what was recovered
        Ok(self.extract_tokens(&tokens, face))
    }

    /// Extraction and completeness check on tokens that were recognised elsewhere.
    pub fn extract_tokens<S: AsRef<str>>(&self, tokens: &[S], face: Face) -> Extraction {
        let record = self.extractor.extract(tokens, face);
        let missing = CompletenessValidator::missing_fields(&record, face);
        if !missing.is_empty() {
            warn!("Incomplete {} face, missing: {}", face, missing.join(", "));
        }

        Extraction {
            face,
            record,
            complete: missing.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    struct FixedTokens(Vec<&'static str>);

    impl TextRecognizer for FixedTokens {
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<String>, IdCardError> {
            Ok(self.0.iter().map(|t| t.to_string()).collect())
        }
    }

    #[test]
    fn extract_tokens_reports_completeness() {
        let reader = IdCardReader::new(FixedTokens(vec![]))
            .with_extractor(FieldExtractor::for_year(2024));

        let complete = reader.extract_tokens(&["MOTHER", "AYŞE", "FATHER", "MEHMET"], Face::Back);
        assert!(complete.complete);
        assert_eq!(complete.face, Face::Back);

        let partial = reader.extract_tokens(&["MOTHER", "AYŞE"], Face::Back);
        assert!(!partial.complete);
        assert_eq!(partial.record.mother_name.as_deref(), Some("AYŞE"));
    }

    #[test]
    fn reader_does_not_freeze_the_year() {
        let reader = IdCardReader::new(FixedTokens(vec![]));
        assert_eq!(reader.extractor.pinned_year(), None);

        let pinned = reader.with_extractor(FieldExtractor::for_year(2024));
        assert_eq!(pinned.extractor.pinned_year(), Some(2024));
    }

    #[test]
    fn boxed_reader_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IdCardReader<Box<dyn TextRecognizer>>>();

        let recognizer: Box<dyn TextRecognizer> =
            Box::new(FixedTokens(vec!["MOTHER", "AYŞE", "FATHER", "MEHMET"]));
        let reader = IdCardReader::new(recognizer);
        let tokens = ["MOTHER", "AYŞE", "FATHER", "MEHMET"];

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| reader.extract_tokens(&tokens, Face::Back)))
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().complete);
            }
        });
    }

    #[test]
    fn undecodable_bytes_fail_before_ocr() {
        let reader = IdCardReader::new(FixedTokens(vec!["MOTHER"]));
        let result = reader.extract_back(b"\x00\x01\x02");
        assert!(matches!(result, Err(IdCardError::InvalidImage(_))));
    }
}
