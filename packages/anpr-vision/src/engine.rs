use image::{DynamicImage, GrayImage};
use thiserror::Error;

use crate::region::{BoundingBox, Region, TextFragment};

/// Fragments at or below this confidence are discarded before joining.
pub const MIN_FRAGMENT_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Error)]
pub enum VisionError {
    /// The collaborator cannot run at all (missing model, missing binary).
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("engine error: {0}")]
    EngineError(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Locates candidate plate regions in a full image.
pub trait RegionDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>, VisionError>;
}

/// Cuts one region out of the image and prepares it for text extraction.
///
/// `Ok(None)` means the region produced an empty crop.
pub trait PlateCropper: Send + Sync {
    fn crop(
        &self,
        image: &DynamicImage,
        bounding_box: &BoundingBox,
    ) -> Result<Option<GrayImage>, VisionError>;
}

/// Reads text from a preprocessed crop.
pub trait TextReader: Send + Sync {
    fn read_fragments(&self, crop: &GrayImage) -> Result<Vec<TextFragment>, VisionError>;

    /// Confident fragments joined in reader order, or `""` if none qualify.
    fn extract_text(&self, crop: &GrayImage) -> Result<String, VisionError> {
        let fragments = self.read_fragments(crop)?;
        Ok(join_confident_fragments(&fragments, MIN_FRAGMENT_CONFIDENCE))
    }
}

pub fn join_confident_fragments(fragments: &[TextFragment], floor: f64) -> String {
    fragments
        .iter()
        .filter(|f| f.confidence > floor)
        .map(|f| f.text.as_str())
        .collect()
}
