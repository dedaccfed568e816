pub mod command;
pub mod crop;
pub mod engine;
pub mod region;

pub use command::{CommandDetector, CommandReader, DEFAULT_DETECTION_CONFIDENCE};
pub use crop::ContrastCropper;
pub use engine::{
    join_confident_fragments, PlateCropper, RegionDetector, TextReader, VisionError,
    MIN_FRAGMENT_CONFIDENCE,
};
pub use region::{BoundingBox, Region, TextFragment};
