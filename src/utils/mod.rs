pub mod config;
pub mod error;

pub use config::{NormalizerConfig, OcrConfig, ReaderConfig};
pub use error::IdCardError;
