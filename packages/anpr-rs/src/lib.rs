//! # anpr-rs
//!
//! License plate recognition around pluggable detection and OCR engines.
//!
//! ## Features
//!
//! - **Plate Normalization**: Canonicalize raw OCR text, repair look-alike characters by position, validate against ordered plate grammars
//! - **Result Orchestration**: Drive each detected region through crop, OCR and normalization with a debug/fallback policy
//! - **HTTP Service**: Multipart `/detect` endpoint returning structured plate records
//! - **Batch CLI**: Run detection over files or directory trees and write JSON reports
//!
//! ## Quick Start
//!
//! ```ignore
//! use anpr_rs::prelude::*;
//!
//! assert_eq!(normalize_plate("ka 01-ab 1234"), "KA01AB1234");
//!
//! let pipeline = AnprPipeline::new(detector, Arc::new(ContrastCropper::new()), reader, PipelineOptions::default());
//! for record in pipeline.run(&image)? {
//!     println!("{:?} {} ({})", record.status, record.plate, record.confidence);
//! }
//! ```

pub mod config;
pub mod pipeline;
pub mod plate_rules;
pub mod report;
pub mod server;

pub use config::{AnprConfig, ConfigError};
pub use pipeline::{best_plate, AnprPipeline, PipelineError, PipelineOptions, PlateRecord, PlateStatus};
pub use plate_rules::{canonicalize, match_plate, normalize_plate, repair_characters, PlateMatch};
pub use report::{DetectionReport, ImageReport};

/// Prelude module for convenient imports
///
/// ```ignore
/// use anpr_rs::prelude::*;
/// ```
pub mod prelude {
  pub use crate::{
    best_plate, canonicalize, match_plate, normalize_plate, repair_characters, AnprConfig, AnprPipeline,
    PipelineError, PipelineOptions, PlateMatch, PlateRecord, PlateStatus,
  };
  pub use anpr_vision::{
    BoundingBox, ContrastCropper, PlateCropper, Region, RegionDetector, TextFragment, TextReader, VisionError,
  };
}
