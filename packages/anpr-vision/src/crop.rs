//! Plate crop preparation: padding, grayscale, histogram equalization, upscale.
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage};

use crate::engine::{PlateCropper, VisionError};
use crate::region::BoundingBox;

/// Pads, equalizes and upscales plate crops before OCR.
#[derive(Debug, Clone)]
pub struct ContrastCropper {
    /// Horizontal padding as a fraction of box width.
    pub pad_x_ratio: f64,
    /// Vertical padding as a fraction of box height.
    pub pad_y_ratio: f64,
    pub upscale: f64,
}

impl ContrastCropper {
    pub fn new() -> Self {
        Self {
            pad_x_ratio: 0.02,
            pad_y_ratio: 0.10,
            upscale: 2.5,
        }
    }

    /// Padded box clamped to the image, or `None` if nothing is left.
    pub fn padded_bounds(
        &self,
        bounding_box: &BoundingBox,
        image_width: u32,
        image_height: u32,
    ) -> Option<(u32, u32, u32, u32)> {
        let pad_x = (self.pad_x_ratio * bounding_box.width() as f64) as i64;
        let pad_y = (self.pad_y_ratio * bounding_box.height() as f64) as i64;

        let x1 = (bounding_box.x1 as i64 - pad_x).max(0);
        let y1 = (bounding_box.y1 as i64 - pad_y).max(0);
        let x2 = (bounding_box.x2 as i64 + pad_x).min(image_width as i64);
        let y2 = (bounding_box.y2 as i64 + pad_y).min(image_height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}

impl Default for ContrastCropper {
    fn default() -> Self {
        Self::new()
    }
}

impl PlateCropper for ContrastCropper {
    fn crop(
        &self,
        image: &DynamicImage,
        bounding_box: &BoundingBox,
    ) -> Result<Option<GrayImage>, VisionError> {
        let (width, height) = image.dimensions();
        let Some((x, y, w, h)) = self.padded_bounds(bounding_box, width, height) else {
            return Ok(None);
        };

        let gray = image.crop_imm(x, y, w, h).to_luma8();
        let equalized = imageproc::contrast::equalize_histogram(&gray);

        let new_w = ((w as f64 * self.upscale).round() as u32).max(1);
        let new_h = ((h as f64 * self.upscale).round() as u32).max(1);
        Ok(Some(imageops::resize(
            &equalized,
            new_w,
            new_h,
            FilterType::CatmullRom,
        )))
    }
}
