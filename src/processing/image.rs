use std::path::Path;

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use log::{debug, info};

use crate::utils::{IdCardError, NormalizerConfig};

/// A decoded image together with the encoding it arrived in.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    /// `None` when the image was built in memory rather than decoded.
    pub format: Option<ImageFormat>,
}

impl SourceImage {
    pub fn new(image: DynamicImage, format: Option<ImageFormat>) -> Self {
        SourceImage { image, format }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdCardError> {
        let format = image::guess_format(bytes).ok();
        let image = image::load_from_memory(bytes)
            .map_err(|e| IdCardError::InvalidImage(format!("Failed to decode image: {}", e)))?;
        debug!(
            "Decoded {:?} image {}x{} ({:?})",
            format,
            image.width(),
            image.height(),
            image.color()
        );
        Ok(SourceImage { image, format })
    }

    pub fn open(path: &Path) -> Result<Self, IdCardError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn is_jpeg(&self) -> bool {
        self.format == Some(ImageFormat::Jpeg)
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub image: DynamicImage,
    /// Whether the image was rescaled and re-encoded, as opposed to passed through.
    pub resized: bool,
}

/// Brings card photos to a bounded width and a JPEG encoding before OCR.
///
/// Phone photos are often several thousand pixels wide, which slows the
/// engine down without improving accuracy on a card this size.
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    config: NormalizerConfig,
}

impl ImageNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        ImageNormalizer { config }
    }

    pub fn needs_normalization(&self, source: &SourceImage) -> bool {
        source.image.width() > self.config.max_width || !source.is_jpeg()
    }

    /// Size after rescaling to the target width, keeping the aspect ratio.
    /// Height is truncated to the pixel grid but never drops below one.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let target_width = self.config.target_width;
        let ratio = target_width as f64 / width as f64;
        let target_height = (height as f64 * ratio) as u32;
        (target_width, target_height.max(1))
    }

    pub fn normalize(&self, source: SourceImage) -> Result<NormalizedImage, IdCardError> {
        let (width, height) = (source.image.width(), source.image.height());
        if width == 0 || height == 0 {
            return Err(IdCardError::InvalidImage(format!(
                "Image has a zero dimension ({}x{})",
                width, height
            )));
        }

        if !self.needs_normalization(&source) {
            debug!("Image {}x{} already fit for OCR, passing through", width, height);
            return Ok(NormalizedImage {
                image: source.image,
                resized: false,
            });
        }

        let rgb = flatten_color(source.image);
        let (target_width, target_height) = self.target_dimensions(width, height);
        info!(
            "Resizing image {}x{} -> {}x{}",
            width, height, target_width, target_height
        );
        let resized = rgb.resize_exact(target_width, target_height, FilterType::CatmullRom);
        let image = reencode_as_jpeg(&resized, &std::env::temp_dir())?;

        Ok(NormalizedImage {
            image,
            resized: true,
        })
    }
}

// Alpha and 16-bit channels are dropped; the JPEG encoder only takes 8-bit
// grey or RGB.
fn flatten_color(image: DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image,
        other => {
            debug!("Converting {:?} image to RGB", other);
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
    }
}

/// Writes the image to a temporary JPEG in `dir` and decodes it again. The
/// file is deleted when the guard drops, whichever way this returns.
fn reencode_as_jpeg(image: &DynamicImage, dir: &Path) -> Result<DynamicImage, IdCardError> {
    let temp_file = tempfile::Builder::new()
        .prefix("kimlik-")
        .suffix(".jpg")
        .tempfile_in(dir)
        .map_err(|e| IdCardError::ImageProcessing(format!("Failed to create temp file: {}", e)))?;

    image
        .save_with_format(temp_file.path(), ImageFormat::Jpeg)
        .map_err(|e| IdCardError::ImageProcessing(format!("Failed to encode JPEG: {}", e)))?;

    image::open(temp_file.path())
        .map_err(|e| IdCardError::ImageProcessing(format!("Failed to reload JPEG: {}", e)))
}
