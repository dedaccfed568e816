//! Process configuration read from `ANPR_*` environment variables.
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_HOST: &str = "ANPR_HOST";
pub const ENV_PORT: &str = "ANPR_PORT";
pub const ENV_MODEL_PATH: &str = "ANPR_MODEL_PATH";
pub const ENV_DEBUG: &str = "ANPR_DEBUG";
pub const ENV_USE_GPU: &str = "ANPR_USE_GPU";
pub const ENV_DETECTOR_CMD: &str = "ANPR_DETECTOR_CMD";
pub const ENV_OCR_CMD: &str = "ANPR_OCR_CMD";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{key} must be a port number, got {value:?}")]
  InvalidPort { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnprConfig {
  pub host: String,
  pub port: u16,
  pub model_path: PathBuf,
  pub debug: bool,
  pub use_gpu: bool,
  pub detector_command: String,
  pub ocr_command: String,
}

impl Default for AnprConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 8000,
      model_path: PathBuf::from("models/best.pt"),
      debug: false,
      use_gpu: false,
      detector_command: "anpr-detect".to_string(),
      ocr_command: "anpr-ocr".to_string(),
    }
  }
}

impl AnprConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds a config from an arbitrary key lookup; unset keys keep defaults.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();

    if let Some(host) = lookup(ENV_HOST) {
      config.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
      config.port = port.trim().parse().map_err(|_| ConfigError::InvalidPort {
        key: ENV_PORT,
        value: port.clone(),
      })?;
    }
    if let Some(path) = lookup(ENV_MODEL_PATH) {
      config.model_path = PathBuf::from(path);
    }
    if let Some(flag) = lookup(ENV_DEBUG) {
      config.debug = parse_flag(&flag);
    }
    if let Some(flag) = lookup(ENV_USE_GPU) {
      config.use_gpu = parse_flag(&flag);
    }
    if let Some(cmd) = lookup(ENV_DETECTOR_CMD) {
      config.detector_command = cmd;
    }
    if let Some(cmd) = lookup(ENV_OCR_CMD) {
      config.ocr_command = cmd;
    }

    Ok(config)
  }
}

/// `true`, `1` and `yes` (any case) are on; everything else is off.
pub fn parse_flag(value: &str) -> bool {
  matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Process-wide debug default, used when a pipeline is built without an
/// explicit debug setting.
pub fn debug_from_env() -> bool {
  std::env::var(ENV_DEBUG).map(|v| parse_flag(&v)).unwrap_or(false)
}
