//! Detector and reader backed by external model sidecars.
//!
//! Each call writes the image to a temporary PNG, runs the configured
//! command with `--image <path>` and parses a JSON document from stdout.
//! Model weights and inference runtimes stay outside this process.
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, GrayImage, ImageFormat};
use serde::Deserialize;
use tracing::debug;

use crate::engine::{RegionDetector, TextReader, VisionError};
use crate::region::{Region, TextFragment};

/// Minimum detector confidence forwarded to the detection sidecar.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Deserialize)]
struct DetectionOutput {
    #[serde(default)]
    detections: Vec<Region>,
}

#[derive(Debug, Deserialize)]
struct ReadOutput {
    #[serde(default)]
    fragments: Vec<TextFragment>,
}

/// A parsed command line: program plus leading arguments.
#[derive(Debug, Clone)]
struct SidecarCommand {
    program: String,
    args: Vec<String>,
}

impl SidecarCommand {
    fn parse(command: &str) -> Result<Self, VisionError> {
        let mut parts = shell_words::split(command)
            .map_err(|e| VisionError::Unavailable(format!("invalid command {command:?}: {e}")))?;
        if parts.is_empty() {
            return Err(VisionError::Unavailable("empty sidecar command".into()));
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }

    fn run(&self, image_path: &Path, extra: &[String]) -> Result<String, VisionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(extra).arg("--image").arg(image_path);

        debug!(program = %self.program, image = %image_path.display(), "running sidecar");

        let output = cmd.output().map_err(|e| {
            VisionError::Unavailable(format!("failed to start {}: {e}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VisionError::EngineError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Slices the outermost JSON object out of sidecar stdout, skipping any
/// banner lines the model runtime prints.
fn extract_json(stdout: &str) -> Result<&str, VisionError> {
    match (stdout.find('{'), stdout.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&stdout[start..=end]),
        _ => Err(VisionError::EngineError(format!(
            "no JSON object in sidecar output: {:?}",
            stdout.trim()
        ))),
    }
}

fn write_temp_png(image: &DynamicImage) -> Result<tempfile::NamedTempFile, VisionError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(VisionError::InvalidInput(format!(
            "empty {}x{} image",
            image.width(),
            image.height()
        )));
    }
    let file = tempfile::Builder::new()
        .prefix("anpr-")
        .suffix(".png")
        .tempfile()?;
    image.save_with_format(file.path(), ImageFormat::Png)?;
    Ok(file)
}

fn parse_detections(stdout: &str) -> Result<Vec<Region>, VisionError> {
    let parsed: DetectionOutput = serde_json::from_str(extract_json(stdout)?)
        .map_err(|e| VisionError::EngineError(format!("bad detector output: {e}")))?;
    Ok(parsed.detections)
}

fn parse_fragments(stdout: &str) -> Result<Vec<TextFragment>, VisionError> {
    let parsed: ReadOutput = serde_json::from_str(extract_json(stdout)?)
        .map_err(|e| VisionError::EngineError(format!("bad reader output: {e}")))?;
    Ok(parsed.fragments)
}

/// Plate detector that shells out to a model sidecar.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    command: SidecarCommand,
    model_path: PathBuf,
    min_confidence: f64,
    use_gpu: bool,
}

impl CommandDetector {
    /// Fails with [`VisionError::Unavailable`] if the model file is missing.
    pub fn new(command: &str, model_path: impl Into<PathBuf>, use_gpu: bool) -> Result<Self, VisionError> {
        let model_path = model_path.into();
        if !model_path.exists() {
            return Err(VisionError::Unavailable(format!(
                "Model not found at {}",
                model_path.display()
            )));
        }
        Ok(Self {
            command: SidecarCommand::parse(command)?,
            model_path,
            min_confidence: DEFAULT_DETECTION_CONFIDENCE,
            use_gpu,
        })
    }
}

impl RegionDetector for CommandDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Region>, VisionError> {
        let file = write_temp_png(image)?;
        let mut extra = vec![
            "--model".to_string(),
            self.model_path.display().to_string(),
            "--min-conf".to_string(),
            self.min_confidence.to_string(),
        ];
        if self.use_gpu {
            extra.push("--gpu".to_string());
        }
        parse_detections(&self.command.run(file.path(), &extra)?)
    }
}

/// Text reader that shells out to an OCR sidecar.
#[derive(Debug, Clone)]
pub struct CommandReader {
    command: SidecarCommand,
    use_gpu: bool,
}

impl CommandReader {
    pub fn new(command: &str, use_gpu: bool) -> Result<Self, VisionError> {
        Ok(Self {
            command: SidecarCommand::parse(command)?,
            use_gpu,
        })
    }
}

impl TextReader for CommandReader {
    fn read_fragments(&self, crop: &GrayImage) -> Result<Vec<TextFragment>, VisionError> {
        let image = DynamicImage::ImageLuma8(crop.clone());
        let file = write_temp_png(&image)?;
        let extra = if self.use_gpu {
            vec!["--gpu".to_string()]
        } else {
            Vec::new()
        };
        parse_fragments(&self.command.run(file.path(), &extra)?)
    }
}
