//! Batch detection over image files, producing a JSON report.
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::pipeline::{best_plate, AnprPipeline, PlateRecord};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "gif", "tif", "tiff"];

/// Results for one input image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
  pub path: String,
  pub plates: Vec<PlateRecord>,
  /// Highest-confidence valid plate, if any.
  pub best: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
  pub generated_at: String,
  pub model: String,
  pub debug: bool,
  pub images: Vec<ImageReport>,
}

impl DetectionReport {
  pub fn total_plates(&self) -> usize {
    self.images.iter().filter(|i| i.best.is_some()).count()
  }
}

fn is_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    .unwrap_or(false)
}

/// A single file is taken as-is; a directory is walked for image files,
/// sorted by path.
pub fn collect_images(root: &Path) -> Result<Vec<PathBuf>> {
  if root.is_file() {
    return Ok(vec![root.to_path_buf()]);
  }
  if !root.is_dir() {
    anyhow::bail!("{} does not exist", root.display());
  }

  let mut images: Vec<PathBuf> = WalkDir::new(root)
    .into_iter()
    .filter_map(|entry| entry.ok())
    .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
    .map(|entry| entry.into_path())
    .collect();
  images.sort();
  Ok(images)
}

/// Runs the pipeline on one file. Undecodable files become an error entry
/// instead of failing the whole batch.
pub fn process_image(pipeline: &AnprPipeline, path: &Path) -> Result<ImageReport> {
  let shown = path.display().to_string();

  let image = match image::open(path) {
    Ok(image) => image,
    Err(e) => {
      warn!("Could not decode {}: {}", shown, e);
      return Ok(ImageReport {
        path: shown,
        plates: Vec::new(),
        best: None,
        error: Some(format!("Could not decode image: {e}")),
      });
    }
  };

  let plates = pipeline
    .run(&image)
    .with_context(|| format!("ANPR processing failed for {shown}"))?;
  let best = best_plate(&plates).map(|r| r.plate.clone());

  Ok(ImageReport {
    path: shown,
    plates,
    best,
    error: None,
  })
}

pub fn build_report(pipeline: &AnprPipeline, paths: &[PathBuf], model: &str) -> Result<DetectionReport> {
  let images = paths
    .iter()
    .map(|path| process_image(pipeline, path))
    .collect::<Result<Vec<_>>>()?;

  Ok(DetectionReport {
    generated_at: Utc::now().to_rfc3339(),
    model: model.to_string(),
    debug: pipeline.debug(),
    images,
  })
}
