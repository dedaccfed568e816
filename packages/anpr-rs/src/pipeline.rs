//! Result orchestration: detect, crop, read and normalize each region of an
//! image, then classify it into a [`PlateRecord`].
use std::sync::Arc;

use anpr_vision::{BoundingBox, PlateCropper, Region, RegionDetector, TextReader, VisionError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config;
use crate::plate_rules::normalize_plate;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("plate detection failed: {0}")]
  Detection(#[from] VisionError),
}

/// Outcome of one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlateStatus {
  /// A plate matching a known grammar was read.
  Ok,
  /// The reader returned no confident text.
  OcrEmpty,
  /// Text was read but matched no grammar.
  FormatRejected,
}

/// One reported region. Built only through the constructors below so the
/// status/field invariants hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateRecord {
  pub bbox: BoundingBox,
  pub plate: String,
  pub raw_text: String,
  pub confidence: f64,
  pub status: PlateStatus,
  /// Unvalidated raw text, uppercased without spaces. Debug mode only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub debug_fallback_text: Option<String>,
}

impl PlateRecord {
  pub fn ok(region: &Region, plate: String, raw_text: String) -> Self {
    Self {
      bbox: region.bounding_box,
      plate,
      raw_text,
      confidence: round_confidence(region.confidence),
      status: PlateStatus::Ok,
      debug_fallback_text: None,
    }
  }

  pub fn ocr_empty(region: &Region) -> Self {
    Self {
      bbox: region.bounding_box,
      plate: String::new(),
      raw_text: String::new(),
      confidence: round_confidence(region.confidence),
      status: PlateStatus::OcrEmpty,
      debug_fallback_text: None,
    }
  }

  pub fn format_rejected(region: &Region, raw_text: String) -> Self {
    let fallback = raw_text.to_uppercase().replace(' ', "");
    Self {
      bbox: region.bounding_box,
      plate: String::new(),
      raw_text,
      confidence: round_confidence(region.confidence),
      status: PlateStatus::FormatRejected,
      debug_fallback_text: Some(fallback),
    }
  }
}

/// Rounds to three decimal places.
pub fn round_confidence(confidence: f64) -> f64 {
  (confidence * 1000.0).round() / 1000.0
}

/// Highest-confidence `OK` record; the earliest one wins a tie.
pub fn best_plate(records: &[PlateRecord]) -> Option<&PlateRecord> {
  records
    .iter()
    .filter(|r| r.status == PlateStatus::Ok && !r.plate.is_empty())
    .fold(None, |best: Option<&PlateRecord>, r| match best {
      Some(b) if b.confidence >= r.confidence => Some(b),
      _ => Some(r),
    })
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
  /// Explicit debug setting; `None` falls back to `ANPR_DEBUG`.
  pub debug: Option<bool>,
}

/// Drives detected regions through crop, text extraction and normalization.
pub struct AnprPipeline {
  detector: Arc<dyn RegionDetector>,
  cropper: Arc<dyn PlateCropper>,
  reader: Arc<dyn TextReader>,
  debug: bool,
}

impl AnprPipeline {
  pub fn new(
    detector: Arc<dyn RegionDetector>,
    cropper: Arc<dyn PlateCropper>,
    reader: Arc<dyn TextReader>,
    options: PipelineOptions,
  ) -> Self {
    let debug = options.debug.unwrap_or_else(config::debug_from_env);
    Self {
      detector,
      cropper,
      reader,
      debug,
    }
  }

  pub fn debug(&self) -> bool {
    self.debug
  }

  /// Processes every detected region in detector order.
  ///
  /// Only a detector failure aborts the image; crop and reader failures
  /// drop the affected region.
  pub fn run(&self, image: &DynamicImage) -> Result<Vec<PlateRecord>, PipelineError> {
    let regions = self.detector.detect(image)?;
    let mut records = Vec::with_capacity(regions.len());

    for (index, region) in regions.iter().enumerate() {
      if let Some(record) = self.process_region(index, image, region) {
        records.push(record);
      }
    }

    info!(
      regions = regions.len(),
      records = records.len(),
      debug = self.debug,
      "image processed"
    );
    Ok(records)
  }

  fn process_region(&self, index: usize, image: &DynamicImage, region: &Region) -> Option<PlateRecord> {
    let crop = match self.cropper.crop(image, &region.bounding_box) {
      Ok(Some(crop)) => crop,
      Ok(None) => {
        debug!(index, bbox = ?region.bounding_box, "empty crop, region dropped");
        return None;
      }
      Err(e) => {
        warn!(index, bbox = ?region.bounding_box, "crop failed: {}", e);
        return None;
      }
    };

    let raw_text = match self.reader.extract_text(&crop) {
      Ok(text) => text,
      Err(e) => {
        warn!(index, bbox = ?region.bounding_box, "text extraction failed: {}", e);
        return None;
      }
    };

    if raw_text.is_empty() {
      if self.debug {
        return Some(PlateRecord::ocr_empty(region));
      }
      debug!(index, "no text read, region dropped");
      return None;
    }

    let plate = normalize_plate(&raw_text);
    if !plate.is_empty() {
      debug!(index, %plate, raw = %raw_text, "plate read");
      return Some(PlateRecord::ok(region, plate, raw_text));
    }

    if self.debug {
      Some(PlateRecord::format_rejected(region, raw_text))
    } else {
      debug!(index, raw = %raw_text, "no plate grammar matched, region dropped");
      None
    }
  }
}
