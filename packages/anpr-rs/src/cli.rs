//! Command line arguments backing the `anpr` binary.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "anpr",
  about = "Automatic number plate recognition: normalize OCR text, run detection, serve HTTP",
  version
)]
pub struct Args {
  #[command(subcommand)]
  pub command: Commands,
}

/// Collaborator settings shared by `detect` and `serve`. Unset values come
/// from the `ANPR_*` environment.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EngineArgs {
  /// Path to the plate detection model
  #[arg(long, short = 'm')]
  pub model: Option<PathBuf>,

  /// Emit diagnostic records for regions that would be dropped
  /// (`--debug=false` turns off `ANPR_DEBUG`)
  #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
  pub debug: Option<bool>,

  /// Ask the model sidecars to run on GPU (`--gpu=false` turns off `ANPR_USE_GPU`)
  #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
  pub gpu: Option<bool>,

  /// Detector sidecar command line
  #[arg(long)]
  pub detector_cmd: Option<String>,

  /// OCR sidecar command line
  #[arg(long)]
  pub ocr_cmd: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Normalize raw OCR text into a plate number
  Normalize {
    /// Raw text as read by OCR
    text: String,
  },
  /// Detect plates in an image file or a directory of images
  Detect {
    /// Image file or directory
    path: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,
  },
  /// Run the HTTP service
  Serve {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    port: Option<u16>,

    #[command(flatten)]
    engine: EngineArgs,
  },
}
