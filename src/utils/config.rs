use std::env;

/// Images wider than this are always downscaled before OCR.
pub const DEFAULT_MAX_WIDTH: u32 = 1200;
/// Width every normalized image is rescaled to.
pub const DEFAULT_TARGET_WIDTH: u32 = 800;
/// English plus Turkish, the two languages printed on the card.
pub const DEFAULT_OCR_LANGUAGE: &str = "eng+tur";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub max_width: u32,
    pub target_width: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            max_width: DEFAULT_MAX_WIDTH,
            target_width: DEFAULT_TARGET_WIDTH,
        }
    }
}

/// Settings handed to the OCR engine when it is first initialised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    /// Directory holding the `*.traineddata` files. `None` lets the engine
    /// fall back to its compiled-in default.
    pub datapath: Option<String>,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            datapath: None,
            language: DEFAULT_OCR_LANGUAGE.to_string(),
        }
    }
}

impl OcrConfig {
    /// Reads `TESSDATA_PREFIX` and `KIMLIK_OCR_LANG`, falling back to the
    /// defaults for anything unset or empty.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        OcrConfig {
            datapath: non_empty("TESSDATA_PREFIX"),
            language: non_empty("KIMLIK_OCR_LANG")
                .unwrap_or_else(|| DEFAULT_OCR_LANGUAGE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderConfig {
    pub normalizer: NormalizerConfig,
    pub ocr: OcrConfig,
}

impl ReaderConfig {
    pub fn from_env() -> Self {
        ReaderConfig {
            normalizer: NormalizerConfig::default(),
            ocr: OcrConfig::from_env(),
        }
    }
}
