use image::DynamicImage;

use crate::utils::{IdCardError, OcrConfig};

/// The OCR engine as seen by the extractor: an image goes in, text fragments
/// come out in reading order.
///
/// Engines are expensive to set up, so implementations are built once and
/// shared by every request, possibly across threads.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, IdCardError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, IdCardError> {
        (**self).recognize(image)
    }
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for &R {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, IdCardError> {
        (**self).recognize(image)
    }
}

/// Splits raw engine output into tokens: one per non-blank line, trimmed.
pub fn split_tokens(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The recognizer this build was compiled with.
#[cfg(feature = "tesseract")]
pub fn default_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, IdCardError> {
    Ok(Box::new(TesseractRecognizer::new(config.clone())?))
}

#[cfg(not(feature = "tesseract"))]
pub fn default_recognizer(_config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, IdCardError> {
    Err(IdCardError::OcrUnavailable)
}

#[cfg(feature = "tesseract")]
pub use self::engine::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod engine {
    use std::sync::Mutex;

    use image::{DynamicImage, ImageFormat};
    use log::{debug, info, warn};
    use tesseract::Tesseract;

    use super::{split_tokens, TextRecognizer};
    use crate::utils::{IdCardError, OcrConfig};

    /// Tesseract-backed recognizer.
    ///
    /// The tesseract bindings consume the engine on every builder call, so the
    /// instance lives in an `Option` that is taken for the duration of a call.
    /// If a call fails halfway the instance is lost and rebuilt on the next one.
    pub struct TesseractRecognizer {
        config: OcrConfig,
        engine: Mutex<EngineSlot>,
    }

    struct EngineSlot(Option<Tesseract>);

    // SAFETY: a TessBaseAPI handle may move between threads as long as it is
    // never used by two at once. The slot is only reachable through the mutex.
    unsafe impl Send for EngineSlot {}

    impl TesseractRecognizer {
        pub fn new(config: OcrConfig) -> Result<Self, IdCardError> {
            let engine = Self::init(&config)?;
            info!(
                "Tesseract initialised (language: {}, datapath: {:?})",
                config.language, config.datapath
            );
            Ok(TesseractRecognizer {
                config,
                engine: Mutex::new(EngineSlot(Some(engine))),
            })
        }

        fn init(config: &OcrConfig) -> Result<Tesseract, IdCardError> {
            Tesseract::new(config.datapath.as_deref(), Some(config.language.as_str()))
                .map_err(|e| IdCardError::Ocr(format!("Tesseract init error: {}", e)))
        }
    }

    impl TextRecognizer for TesseractRecognizer {
        fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, IdCardError> {
            let temp_file = tempfile::Builder::new()
                .prefix("kimlik-ocr-")
                .suffix(".png")
                .tempfile()?;
            image
                .save_with_format(temp_file.path(), ImageFormat::Png)
                .map_err(|e| IdCardError::Ocr(format!("Failed to write OCR input: {}", e)))?;
            let image_path = temp_file
                .path()
                .to_str()
                .ok_or_else(|| IdCardError::Ocr("Failed to convert path to string".to_string()))?;

            let mut slot = self
                .engine
                .lock()
                .map_err(|_| IdCardError::Ocr("OCR engine lock poisoned".to_string()))?;
            let engine = match slot.0.take() {
                Some(engine) => engine,
                None => {
                    warn!("Re-initialising Tesseract after a failed call");
                    Self::init(&self.config)?
                }
            };

            let mut engine = engine
                .set_image(image_path)
                .map_err(|e| IdCardError::Ocr(format!("Tesseract set image error: {}", e)))?;
            let text = engine
                .get_text()
                .map_err(|e| IdCardError::Ocr(format!("Tesseract error: {}", e)));
            slot.0 = Some(engine);

            let tokens = split_tokens(&text?);
            debug!("Tesseract returned {} tokens", tokens.len());
            Ok(tokens)
        }
    }
}
